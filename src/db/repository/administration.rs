use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{AdministrationStatus, Role};
use crate::models::AdministrationRecord;

use super::{format_dt, parse_dt, parse_uuid};

const RECORD_COLUMNS: &str = "id, order_id, patient_id, scheduled_time, status, dose_given,
     administered_by, administered_role, finalized_at, not_given_reason, prn_reason,
     witness_id, notes, assessment_id, corrects_record_id, created_at";

/// Raw row from administration_records before enum/uuid conversion.
struct RecordRow {
    id: String,
    order_id: String,
    patient_id: String,
    scheduled_time: String,
    status: String,
    dose_given: Option<String>,
    administered_by: Option<String>,
    administered_role: Option<String>,
    finalized_at: Option<String>,
    not_given_reason: Option<String>,
    prn_reason: Option<String>,
    witness_id: Option<String>,
    notes: Option<String>,
    assessment_id: Option<String>,
    corrects_record_id: Option<String>,
    created_at: String,
}

fn record_row(row: &Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        id: row.get(0)?,
        order_id: row.get(1)?,
        patient_id: row.get(2)?,
        scheduled_time: row.get(3)?,
        status: row.get(4)?,
        dose_given: row.get(5)?,
        administered_by: row.get(6)?,
        administered_role: row.get(7)?,
        finalized_at: row.get(8)?,
        not_given_reason: row.get(9)?,
        prn_reason: row.get(10)?,
        witness_id: row.get(11)?,
        notes: row.get(12)?,
        assessment_id: row.get(13)?,
        corrects_record_id: row.get(14)?,
        created_at: row.get(15)?,
    })
}

fn record_from_row(raw: RecordRow) -> Result<AdministrationRecord, DatabaseError> {
    Ok(AdministrationRecord {
        id: parse_uuid(&raw.id)?,
        order_id: parse_uuid(&raw.order_id)?,
        patient_id: parse_uuid(&raw.patient_id)?,
        scheduled_time: parse_dt(&raw.scheduled_time)?,
        status: AdministrationStatus::from_str(&raw.status)?,
        dose_given: raw.dose_given,
        administered_by: raw
            .administered_by
            .as_deref()
            .map(parse_uuid)
            .transpose()?,
        administered_role: raw
            .administered_role
            .as_deref()
            .map(Role::from_str)
            .transpose()?,
        finalized_at: raw.finalized_at.as_deref().map(parse_dt).transpose()?,
        not_given_reason: raw.not_given_reason,
        prn_reason: raw.prn_reason,
        witness_id: raw.witness_id.as_deref().map(parse_uuid).transpose()?,
        notes: raw.notes,
        assessment_id: raw.assessment_id.as_deref().map(parse_uuid).transpose()?,
        corrects_record_id: raw
            .corrects_record_id
            .as_deref()
            .map(parse_uuid)
            .transpose()?,
        created_at: parse_dt(&raw.created_at)?,
    })
}

pub fn insert_record(
    conn: &Connection,
    record: &AdministrationRecord,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO administration_records (id, order_id, patient_id, scheduled_time, status,
         dose_given, administered_by, administered_role, finalized_at, not_given_reason,
         prn_reason, witness_id, notes, assessment_id, corrects_record_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            record.id.to_string(),
            record.order_id.to_string(),
            record.patient_id.to_string(),
            format_dt(&record.scheduled_time),
            record.status.as_str(),
            record.dose_given,
            record.administered_by.map(|u| u.to_string()),
            record.administered_role.map(|r| r.as_str()),
            record.finalized_at.as_ref().map(format_dt),
            record.not_given_reason,
            record.prn_reason,
            record.witness_id.map(|u| u.to_string()),
            record.notes,
            record.assessment_id.map(|u| u.to_string()),
            record.corrects_record_id.map(|u| u.to_string()),
            format_dt(&record.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_record(conn: &Connection, id: &Uuid) -> Result<AdministrationRecord, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM administration_records WHERE id = ?1"
    ))?;

    let mut rows = stmt.query_map(params![id.to_string()], record_row)?;
    match rows.next() {
        Some(raw) => record_from_row(raw?),
        None => Err(DatabaseError::NotFound {
            entity_type: "AdministrationRecord".into(),
            id: id.to_string(),
        }),
    }
}

/// Pending records, optionally scoped to one patient, oldest schedule first.
pub fn pending_records(
    conn: &Connection,
    patient_id: Option<&Uuid>,
) -> Result<Vec<AdministrationRecord>, DatabaseError> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM administration_records
         WHERE status = 'pending' AND (?1 IS NULL OR patient_id = ?1)
         ORDER BY scheduled_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt.query_map(params![patient_id.map(|u| u.to_string())], record_row)?;

    let mut records = Vec::new();
    for raw in rows {
        records.push(record_from_row(raw?)?);
    }
    Ok(records)
}

/// Records for one patient with scheduled_time inside [from, to], for the
/// MAR view. All statuses, oldest first.
pub fn records_for_patient_between(
    conn: &Connection,
    patient_id: &Uuid,
    from: &NaiveDateTime,
    to: &NaiveDateTime,
) -> Result<Vec<AdministrationRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM administration_records
         WHERE patient_id = ?1 AND scheduled_time >= ?2 AND scheduled_time <= ?3
         ORDER BY scheduled_time ASC"
    ))?;

    let rows = stmt.query_map(
        params![patient_id.to_string(), format_dt(from), format_dt(to)],
        record_row,
    )?;

    let mut records = Vec::new();
    for raw in rows {
        records.push(record_from_row(raw?)?);
    }
    Ok(records)
}

/// Terminal fields written by a finalize transition.
pub struct FinalizeUpdate<'a> {
    pub status: AdministrationStatus,
    pub dose_given: Option<&'a str>,
    pub administered_by: Uuid,
    pub administered_role: Role,
    pub finalized_at: NaiveDateTime,
    pub not_given_reason: Option<&'a str>,
    pub prn_reason: Option<&'a str>,
    pub witness_id: Option<Uuid>,
    pub notes: Option<&'a str>,
    pub assessment_id: Option<Uuid>,
}

/// Atomically transition one record out of `pending`.
///
/// The `status = 'pending'` predicate is the transition guard: of any number
/// of concurrent finalize attempts, exactly one updates a row. Returns
/// whether this caller won. Never touches an already-terminal row.
pub fn finalize_pending(
    conn: &Connection,
    record_id: &Uuid,
    update: &FinalizeUpdate<'_>,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE administration_records
         SET status = ?1, dose_given = ?2, administered_by = ?3, administered_role = ?4,
             finalized_at = ?5, not_given_reason = ?6, prn_reason = ?7, witness_id = ?8,
             notes = ?9, assessment_id = ?10
         WHERE id = ?11 AND status = 'pending'",
        params![
            update.status.as_str(),
            update.dose_given,
            update.administered_by.to_string(),
            update.administered_role.as_str(),
            format_dt(&update.finalized_at),
            update.not_given_reason,
            update.prn_reason,
            update.witness_id.map(|u| u.to_string()),
            update.notes,
            update.assessment_id.map(|u| u.to_string()),
            record_id.to_string(),
        ],
    )?;
    Ok(updated == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::order::insert_order;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::OrderStatus;
    use crate::models::MedicationOrder;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn seed_order(conn: &Connection, patient_id: Uuid) -> Uuid {
        let order = MedicationOrder {
            id: Uuid::new_v4(),
            patient_id,
            name: "Lisinopril".into(),
            dose: "10mg".into(),
            route: "PO".into(),
            frequency: "Daily".into(),
            drug_class: None,
            is_prn: false,
            is_controlled_substance: false,
            is_high_risk: false,
            is_sliding_scale: false,
            status: OrderStatus::Active,
            hold_reason: None,
            prescriber: None,
            start_date: None,
            end_date: None,
            created_at: dt("2026-03-01 08:00:00"),
        };
        insert_order(conn, &order).unwrap();
        order.id
    }

    fn seed_pending(conn: &Connection, patient_id: Uuid, scheduled: &str) -> Uuid {
        let order_id = seed_order(conn, patient_id);
        let record =
            AdministrationRecord::pending(order_id, patient_id, dt(scheduled), dt(scheduled));
        insert_record(conn, &record).unwrap();
        record.id
    }

    #[test]
    fn pending_round_trip() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let record_id = seed_pending(&conn, patient, "2026-03-02 09:00:00");

        let loaded = get_record(&conn, &record_id).unwrap();
        assert_eq!(loaded.status, AdministrationStatus::Pending);
        assert!(loaded.finalized_at.is_none());
        assert!(loaded.administered_by.is_none());
    }

    #[test]
    fn finalize_guard_transitions_exactly_once() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let record_id = seed_pending(&conn, patient, "2026-03-02 09:00:00");
        let nurse = Uuid::new_v4();

        let update = FinalizeUpdate {
            status: AdministrationStatus::Given,
            dose_given: Some("10mg"),
            administered_by: nurse,
            administered_role: Role::Rn,
            finalized_at: dt("2026-03-02 09:05:00"),
            not_given_reason: None,
            prn_reason: None,
            witness_id: None,
            notes: None,
            assessment_id: None,
        };

        assert!(finalize_pending(&conn, &record_id, &update).unwrap());
        // Second attempt loses the guard
        assert!(!finalize_pending(&conn, &record_id, &update).unwrap());

        let loaded = get_record(&conn, &record_id).unwrap();
        assert_eq!(loaded.status, AdministrationStatus::Given);
        assert_eq!(loaded.administered_by, Some(nurse));
        assert_eq!(loaded.administered_role, Some(Role::Rn));
        assert_eq!(loaded.finalized_at, Some(dt("2026-03-02 09:05:00")));
    }

    #[test]
    fn losing_finalize_does_not_overwrite_winner() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let record_id = seed_pending(&conn, patient, "2026-03-02 09:00:00");

        let winner = FinalizeUpdate {
            status: AdministrationStatus::Given,
            dose_given: Some("10mg"),
            administered_by: Uuid::new_v4(),
            administered_role: Role::Rn,
            finalized_at: dt("2026-03-02 09:05:00"),
            not_given_reason: None,
            prn_reason: None,
            witness_id: None,
            notes: None,
            assessment_id: None,
        };
        let loser = FinalizeUpdate {
            status: AdministrationStatus::Refused,
            dose_given: None,
            administered_by: Uuid::new_v4(),
            administered_role: Role::Lpn,
            finalized_at: dt("2026-03-02 09:06:00"),
            not_given_reason: Some("patient refused"),
            prn_reason: None,
            witness_id: None,
            notes: None,
            assessment_id: None,
        };

        assert!(finalize_pending(&conn, &record_id, &winner).unwrap());
        assert!(!finalize_pending(&conn, &record_id, &loser).unwrap());

        let loaded = get_record(&conn, &record_id).unwrap();
        assert_eq!(loaded.status, AdministrationStatus::Given);
        assert_eq!(loaded.dose_given.as_deref(), Some("10mg"));
        assert!(loaded.not_given_reason.is_none());
    }

    #[test]
    fn pending_records_scoped_by_patient() {
        let conn = open_memory_database().unwrap();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        seed_pending(&conn, alice, "2026-03-02 09:00:00");
        seed_pending(&conn, bob, "2026-03-02 10:00:00");

        assert_eq!(pending_records(&conn, Some(&alice)).unwrap().len(), 1);
        assert_eq!(pending_records(&conn, None).unwrap().len(), 2);
    }

    #[test]
    fn correction_links_original() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let original_id = seed_pending(&conn, patient, "2026-03-02 09:00:00");
        let original = get_record(&conn, &original_id).unwrap();

        let mut correction = AdministrationRecord::pending(
            original.order_id,
            patient,
            original.scheduled_time,
            dt("2026-03-02 12:00:00"),
        );
        correction.status = AdministrationStatus::Omitted;
        correction.corrects_record_id = Some(original_id);
        insert_record(&conn, &correction).unwrap();

        let loaded = get_record(&conn, &correction.id).unwrap();
        assert_eq!(loaded.corrects_record_id, Some(original_id));
    }
}
