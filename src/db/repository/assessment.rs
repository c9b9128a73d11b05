use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::AssessmentSnapshot;

use super::{format_dt, parse_dt, parse_uuid};

const SNAPSHOT_COLUMNS: &str = "id, record_id, heart_rate, bp_systolic, bp_diastolic,
     visual_disturbance, gi_upset, dizziness, bleeding_or_bruising, verified, observed_at";

/// Raw row from assessment_snapshots before uuid/datetime conversion.
struct SnapshotRow {
    id: String,
    record_id: String,
    heart_rate: Option<i32>,
    bp_systolic: Option<i32>,
    bp_diastolic: Option<i32>,
    visual_disturbance: i32,
    gi_upset: i32,
    dizziness: i32,
    bleeding_or_bruising: i32,
    verified: i32,
    observed_at: String,
}

fn snapshot_row(row: &Row<'_>) -> rusqlite::Result<SnapshotRow> {
    Ok(SnapshotRow {
        id: row.get(0)?,
        record_id: row.get(1)?,
        heart_rate: row.get(2)?,
        bp_systolic: row.get(3)?,
        bp_diastolic: row.get(4)?,
        visual_disturbance: row.get(5)?,
        gi_upset: row.get(6)?,
        dizziness: row.get(7)?,
        bleeding_or_bruising: row.get(8)?,
        verified: row.get(9)?,
        observed_at: row.get(10)?,
    })
}

fn snapshot_from_row(raw: SnapshotRow) -> Result<AssessmentSnapshot, DatabaseError> {
    Ok(AssessmentSnapshot {
        id: parse_uuid(&raw.id)?,
        record_id: parse_uuid(&raw.record_id)?,
        heart_rate: raw.heart_rate,
        bp_systolic: raw.bp_systolic,
        bp_diastolic: raw.bp_diastolic,
        visual_disturbance: raw.visual_disturbance != 0,
        gi_upset: raw.gi_upset != 0,
        dizziness: raw.dizziness != 0,
        bleeding_or_bruising: raw.bleeding_or_bruising != 0,
        verified: raw.verified != 0,
        observed_at: parse_dt(&raw.observed_at)?,
    })
}

pub fn insert_snapshot(
    conn: &Connection,
    snapshot: &AssessmentSnapshot,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO assessment_snapshots (id, record_id, heart_rate, bp_systolic, bp_diastolic,
         visual_disturbance, gi_upset, dizziness, bleeding_or_bruising, verified, observed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            snapshot.id.to_string(),
            snapshot.record_id.to_string(),
            snapshot.heart_rate,
            snapshot.bp_systolic,
            snapshot.bp_diastolic,
            snapshot.visual_disturbance as i32,
            snapshot.gi_upset as i32,
            snapshot.dizziness as i32,
            snapshot.bleeding_or_bruising as i32,
            snapshot.verified as i32,
            format_dt(&snapshot.observed_at),
        ],
    )?;
    Ok(())
}

/// The snapshot collected for one administration attempt, if any.
/// Snapshots are never shared across attempts, so record_id is unique
/// in practice.
pub fn snapshot_for_record(
    conn: &Connection,
    record_id: &Uuid,
) -> Result<Option<AssessmentSnapshot>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM assessment_snapshots
         WHERE record_id = ?1 ORDER BY observed_at DESC LIMIT 1"
    ))?;

    let mut rows = stmt.query_map(params![record_id.to_string()], snapshot_row)?;
    match rows.next() {
        Some(raw) => Ok(Some(snapshot_from_row(raw?)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{insert_record, insert_order};
    use crate::db::sqlite::open_memory_database;
    use crate::models::{AdministrationRecord, MedicationOrder};
    use crate::models::enums::OrderStatus;
    use crate::test_support::dt;

    #[test]
    fn snapshot_round_trip() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();

        let order = MedicationOrder {
            id: Uuid::new_v4(),
            patient_id: patient,
            name: "Digoxin".into(),
            dose: "0.125mg".into(),
            route: "PO".into(),
            frequency: "Daily".into(),
            drug_class: None,
            is_prn: false,
            is_controlled_substance: false,
            is_high_risk: true,
            is_sliding_scale: false,
            status: OrderStatus::Active,
            hold_reason: None,
            prescriber: None,
            start_date: None,
            end_date: None,
            created_at: dt("2026-03-01 08:00:00"),
        };
        insert_order(&conn, &order).unwrap();

        let record = AdministrationRecord::pending(
            order.id,
            patient,
            dt("2026-03-02 09:00:00"),
            dt("2026-03-02 09:00:00"),
        );
        insert_record(&conn, &record).unwrap();

        let mut snapshot = AssessmentSnapshot::new(record.id, dt("2026-03-02 09:01:00"));
        snapshot.heart_rate = Some(52);
        snapshot.dizziness = true;
        snapshot.verified = true;
        insert_snapshot(&conn, &snapshot).unwrap();

        let loaded = snapshot_for_record(&conn, &record.id).unwrap().unwrap();
        assert_eq!(loaded.heart_rate, Some(52));
        assert!(loaded.dizziness);
        assert!(loaded.verified);
        assert!(!loaded.bleeding_or_bruising);
    }

    #[test]
    fn no_snapshot_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(snapshot_for_record(&conn, &Uuid::new_v4()).unwrap().is_none());
    }
}
