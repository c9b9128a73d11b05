use std::str::FromStr;

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{AcknowledgmentAction, AlertConfidence, AlertSeverity, AlertStatus};
use crate::models::{Acknowledgment, AdrAlert};

use super::{format_dt, parse_dt, parse_uuid};

const ALERT_COLUMNS: &str = "id, patient_id, medication_id, suspected_reaction, summary,
     severity, confidence, status, created_at, resolved_at";

struct AlertRow {
    id: String,
    patient_id: String,
    medication_id: String,
    suspected_reaction: String,
    summary: String,
    severity: String,
    confidence: String,
    status: String,
    created_at: String,
    resolved_at: Option<String>,
}

fn alert_row(row: &Row<'_>) -> rusqlite::Result<AlertRow> {
    Ok(AlertRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        medication_id: row.get(2)?,
        suspected_reaction: row.get(3)?,
        summary: row.get(4)?,
        severity: row.get(5)?,
        confidence: row.get(6)?,
        status: row.get(7)?,
        created_at: row.get(8)?,
        resolved_at: row.get(9)?,
    })
}

fn alert_from_row(raw: AlertRow) -> Result<AdrAlert, DatabaseError> {
    Ok(AdrAlert {
        id: parse_uuid(&raw.id)?,
        patient_id: parse_uuid(&raw.patient_id)?,
        medication_id: parse_uuid(&raw.medication_id)?,
        suspected_reaction: raw.suspected_reaction,
        summary: raw.summary,
        severity: AlertSeverity::from_str(&raw.severity)?,
        confidence: AlertConfidence::from_str(&raw.confidence)?,
        status: AlertStatus::from_str(&raw.status)?,
        created_at: parse_dt(&raw.created_at)?,
        resolved_at: raw.resolved_at.as_deref().map(parse_dt).transpose()?,
    })
}

pub fn insert_alert(conn: &Connection, alert: &AdrAlert) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO adr_alerts (id, patient_id, medication_id, suspected_reaction, summary,
         severity, confidence, status, created_at, resolved_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            alert.id.to_string(),
            alert.patient_id.to_string(),
            alert.medication_id.to_string(),
            alert.suspected_reaction,
            alert.summary,
            alert.severity.as_str(),
            alert.confidence.as_str(),
            alert.status.as_str(),
            format_dt(&alert.created_at),
            alert.resolved_at.as_ref().map(format_dt),
        ],
    )?;
    Ok(())
}

pub fn get_alert(conn: &Connection, id: &Uuid) -> Result<AdrAlert, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALERT_COLUMNS} FROM adr_alerts WHERE id = ?1"
    ))?;

    let mut rows = stmt.query_map(params![id.to_string()], alert_row)?;
    match rows.next() {
        Some(raw) => alert_from_row(raw?),
        None => Err(DatabaseError::NotFound {
            entity_type: "AdrAlert".into(),
            id: id.to_string(),
        }),
    }
}

/// Every alert for the patient that has not been resolved by the upstream
/// surveillance process. These are the alerts that gate administration.
pub fn open_alerts_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<AdrAlert>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALERT_COLUMNS} FROM adr_alerts
         WHERE patient_id = ?1 AND status != 'resolved'
         ORDER BY created_at ASC"
    ))?;

    let rows = stmt.query_map(params![patient_id.to_string()], alert_row)?;

    let mut alerts = Vec::new();
    for raw in rows {
        alerts.push(alert_from_row(raw?)?);
    }
    Ok(alerts)
}

pub fn set_alert_status(
    conn: &Connection,
    id: &Uuid,
    status: AlertStatus,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE adr_alerts SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "AdrAlert".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn insert_acknowledgment(
    conn: &Connection,
    ack: &Acknowledgment,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO adr_acknowledgments (id, alert_id, user_id, action,
         verified_reaction_awareness, verified_monitoring_parameters,
         verified_escalation_criteria, hold_reason, hold_duration,
         provider_notified, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            ack.id.to_string(),
            ack.alert_id.to_string(),
            ack.user_id.to_string(),
            ack.action.as_str(),
            ack.verified_reaction_awareness as i32,
            ack.verified_monitoring_parameters as i32,
            ack.verified_escalation_criteria as i32,
            ack.hold_reason,
            ack.hold_duration,
            ack.provider_notified as i32,
            ack.notes,
            format_dt(&ack.created_at),
        ],
    )?;
    Ok(())
}

/// The most recent acknowledgment of one alert by one user, if any.
/// Acknowledgment is per-(alert, user); other users' acknowledgments are
/// invisible here.
pub fn latest_acknowledgment(
    conn: &Connection,
    alert_id: &Uuid,
    user_id: &Uuid,
) -> Result<Option<Acknowledgment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, alert_id, user_id, action, verified_reaction_awareness,
                verified_monitoring_parameters, verified_escalation_criteria,
                hold_reason, hold_duration, provider_notified, notes, created_at
         FROM adr_acknowledgments
         WHERE alert_id = ?1 AND user_id = ?2
         ORDER BY created_at DESC LIMIT 1",
    )?;

    let mut rows = stmt.query_map(
        params![alert_id.to_string(), user_id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i32>(4)?,
                row.get::<_, i32>(5)?,
                row.get::<_, i32>(6)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, Option<String>>(8)?,
                row.get::<_, i32>(9)?,
                row.get::<_, Option<String>>(10)?,
                row.get::<_, String>(11)?,
            ))
        },
    )?;

    match rows.next() {
        Some(raw) => {
            let (
                id,
                alert_id,
                user_id,
                action,
                awareness,
                monitoring,
                escalation,
                hold_reason,
                hold_duration,
                provider_notified,
                notes,
                created_at,
            ) = raw?;
            Ok(Some(Acknowledgment {
                id: parse_uuid(&id)?,
                alert_id: parse_uuid(&alert_id)?,
                user_id: parse_uuid(&user_id)?,
                action: AcknowledgmentAction::from_str(&action)?,
                verified_reaction_awareness: awareness != 0,
                verified_monitoring_parameters: monitoring != 0,
                verified_escalation_criteria: escalation != 0,
                hold_reason,
                hold_duration,
                provider_notified: provider_notified != 0,
                notes,
                created_at: parse_dt(&created_at)?,
            }))
        }
        None => Ok(None),
    }
}
