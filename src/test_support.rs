//! Shared fixtures for colocated tests.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{insert_alert, insert_order, insert_record};
use crate::models::enums::{AlertConfidence, AlertSeverity, AlertStatus, OrderStatus};
use crate::models::{AdministrationRecord, AdrAlert, MedicationOrder};

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// A routine active oral medication with no safety flags.
pub fn make_order(patient_id: Uuid) -> MedicationOrder {
    MedicationOrder {
        id: Uuid::new_v4(),
        patient_id,
        name: "Amlodipine".into(),
        dose: "5mg".into(),
        route: "PO".into(),
        frequency: "Daily".into(),
        drug_class: None,
        is_prn: false,
        is_controlled_substance: false,
        is_high_risk: false,
        is_sliding_scale: false,
        status: OrderStatus::Active,
        hold_reason: None,
        prescriber: Some("Dr. Whitfield".into()),
        start_date: None,
        end_date: None,
        created_at: dt("2026-03-01 08:00:00"),
    }
}

pub fn seed_order(conn: &Connection, patient_id: Uuid) -> Uuid {
    let order = make_order(patient_id);
    insert_order(conn, &order).unwrap();
    order.id
}

pub fn seed_order_with(
    conn: &Connection,
    patient_id: Uuid,
    customize: impl FnOnce(&mut MedicationOrder),
) -> Uuid {
    let mut order = make_order(patient_id);
    customize(&mut order);
    insert_order(conn, &order).unwrap();
    order.id
}

pub fn seed_alert(
    conn: &Connection,
    patient_id: Uuid,
    medication_id: Uuid,
    created_at: &str,
) -> Uuid {
    let alert = AdrAlert {
        id: Uuid::new_v4(),
        patient_id,
        medication_id,
        suspected_reaction: "dizziness".into(),
        summary: "Dizziness reported after morning dose".into(),
        severity: AlertSeverity::Moderate,
        confidence: AlertConfidence::Medium,
        status: AlertStatus::New,
        created_at: dt(created_at),
        resolved_at: None,
    };
    insert_alert(conn, &alert).unwrap();
    alert.id
}

pub fn seed_pending(
    conn: &Connection,
    order_id: Uuid,
    patient_id: Uuid,
    scheduled: &str,
) -> Uuid {
    let record = AdministrationRecord::pending(order_id, patient_id, dt(scheduled), dt(scheduled));
    insert_record(conn, &record).unwrap();
    record.id
}
