use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{DrugClass, OrderStatus};
use crate::models::MedicationOrder;

use super::{format_dt, parse_dt, parse_uuid};

const ORDER_COLUMNS: &str = "id, patient_id, name, dose, route, frequency, drug_class,
     is_prn, is_controlled_substance, is_high_risk, is_sliding_scale,
     status, hold_reason, prescriber, start_date, end_date, created_at";

/// Raw row from medication_orders before enum/uuid conversion.
struct OrderRow {
    id: String,
    patient_id: String,
    name: String,
    dose: String,
    route: String,
    frequency: String,
    drug_class: Option<String>,
    is_prn: i32,
    is_controlled_substance: i32,
    is_high_risk: i32,
    is_sliding_scale: i32,
    status: String,
    hold_reason: Option<String>,
    prescriber: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    created_at: String,
}

fn order_row(row: &Row<'_>) -> rusqlite::Result<OrderRow> {
    Ok(OrderRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        name: row.get(2)?,
        dose: row.get(3)?,
        route: row.get(4)?,
        frequency: row.get(5)?,
        drug_class: row.get(6)?,
        is_prn: row.get(7)?,
        is_controlled_substance: row.get(8)?,
        is_high_risk: row.get(9)?,
        is_sliding_scale: row.get(10)?,
        status: row.get(11)?,
        hold_reason: row.get(12)?,
        prescriber: row.get(13)?,
        start_date: row.get(14)?,
        end_date: row.get(15)?,
        created_at: row.get(16)?,
    })
}

fn order_from_row(raw: OrderRow) -> Result<MedicationOrder, DatabaseError> {
    Ok(MedicationOrder {
        id: parse_uuid(&raw.id)?,
        patient_id: parse_uuid(&raw.patient_id)?,
        name: raw.name,
        dose: raw.dose,
        route: raw.route,
        frequency: raw.frequency,
        drug_class: raw
            .drug_class
            .as_deref()
            .map(DrugClass::from_str)
            .transpose()?,
        is_prn: raw.is_prn != 0,
        is_controlled_substance: raw.is_controlled_substance != 0,
        is_high_risk: raw.is_high_risk != 0,
        is_sliding_scale: raw.is_sliding_scale != 0,
        status: OrderStatus::from_str(&raw.status)?,
        hold_reason: raw.hold_reason,
        prescriber: raw.prescriber,
        start_date: raw.start_date.and_then(|d| NaiveDate::from_str(&d).ok()),
        end_date: raw.end_date.and_then(|d| NaiveDate::from_str(&d).ok()),
        created_at: parse_dt(&raw.created_at)?,
    })
}

pub fn insert_order(conn: &Connection, order: &MedicationOrder) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medication_orders (id, patient_id, name, dose, route, frequency, drug_class,
         is_prn, is_controlled_substance, is_high_risk, is_sliding_scale, status, hold_reason,
         prescriber, start_date, end_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            order.id.to_string(),
            order.patient_id.to_string(),
            order.name,
            order.dose,
            order.route,
            order.frequency,
            order.drug_class.map(|c| c.as_str()),
            order.is_prn as i32,
            order.is_controlled_substance as i32,
            order.is_high_risk as i32,
            order.is_sliding_scale as i32,
            order.status.as_str(),
            order.hold_reason,
            order.prescriber,
            order.start_date.map(|d| d.to_string()),
            order.end_date.map(|d| d.to_string()),
            format_dt(&order.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_order(conn: &Connection, id: &Uuid) -> Result<MedicationOrder, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS} FROM medication_orders WHERE id = ?1"
    ))?;

    let mut rows = stmt.query_map(params![id.to_string()], order_row)?;
    match rows.next() {
        Some(raw) => order_from_row(raw?),
        None => Err(DatabaseError::NotFound {
            entity_type: "MedicationOrder".into(),
            id: id.to_string(),
        }),
    }
}

pub fn get_active_orders_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<MedicationOrder>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS} FROM medication_orders
         WHERE patient_id = ?1 AND status = 'active' ORDER BY name"
    ))?;

    let rows = stmt.query_map(params![patient_id.to_string()], order_row)?;

    let mut orders = Vec::new();
    for raw in rows {
        orders.push(order_from_row(raw?)?);
    }
    Ok(orders)
}

/// Transition an order's lifecycle status. `hold_reason` is recorded when
/// moving to `held` and cleared on any other transition.
pub fn update_order_status(
    conn: &Connection,
    id: &Uuid,
    status: OrderStatus,
    hold_reason: Option<&str>,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE medication_orders SET status = ?1, hold_reason = ?2 WHERE id = ?3",
        params![status.as_str(), hold_reason, id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "MedicationOrder".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
