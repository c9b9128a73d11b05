//! Read-only MAR summary view.
//!
//! Per-patient medication administration record over a date window:
//! each active order with its dose opportunities and given/missed
//! counts. View types serialize for the presentation layer, which
//! renders them without re-implementing any rule.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{get_active_orders_for_patient, records_for_patient_between};
use crate::db::DatabaseError;
use crate::models::enums::AdministrationStatus;
use crate::models::{AdministrationRecord, MedicationOrder};

/// One order's rows on the MAR.
#[derive(Debug, Clone, Serialize)]
pub struct MarEntry {
    pub order: MedicationOrder,
    pub records: Vec<AdministrationRecord>,
    pub given_count: u32,
    pub missed_count: u32,
}

/// The MAR for one patient over [from, to].
#[derive(Debug, Clone, Serialize)]
pub struct PatientMar {
    pub patient_id: Uuid,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub entries: Vec<MarEntry>,
}

/// Build the MAR summary. Missed counts refused, held, and omitted
/// doses; pending slots count as neither.
pub fn patient_mar(
    conn: &Connection,
    patient_id: &Uuid,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<PatientMar, DatabaseError> {
    let orders = get_active_orders_for_patient(conn, patient_id)?;
    let all_records = records_for_patient_between(conn, patient_id, &from, &to)?;

    let mut entries = Vec::with_capacity(orders.len());
    for order in orders {
        let records: Vec<AdministrationRecord> = all_records
            .iter()
            .filter(|r| r.order_id == order.id)
            .cloned()
            .collect();

        let given_count = records
            .iter()
            .filter(|r| r.status == AdministrationStatus::Given)
            .count() as u32;
        let missed_count = records
            .iter()
            .filter(|r| {
                matches!(
                    r.status,
                    AdministrationStatus::Refused
                        | AdministrationStatus::Held
                        | AdministrationStatus::Omitted
                )
            })
            .count() as u32;

        entries.push(MarEntry {
            order,
            records,
            given_count,
            missed_count,
        });
    }

    Ok(PatientMar {
        patient_id: *patient_id,
        from,
        to,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::administration::{finalize, FinalizePayload};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::Role;
    use crate::test_support::{dt, seed_order, seed_order_with, seed_pending};

    #[test]
    fn counts_given_and_missed_per_order() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let order_id = seed_order(&conn, patient);
        let nurse = Uuid::new_v4();

        let morning = seed_pending(&conn, order_id, patient, "2026-03-02 08:00:00");
        let noon = seed_pending(&conn, order_id, patient, "2026-03-02 12:00:00");
        let evening = seed_pending(&conn, order_id, patient, "2026-03-02 18:00:00");

        finalize(
            &conn,
            &morning,
            &nurse,
            Role::Rn,
            &FinalizePayload::new(AdministrationStatus::Given),
            dt("2026-03-02 08:05:00"),
        )
        .unwrap();
        let mut refused = FinalizePayload::new(AdministrationStatus::Refused);
        refused.not_given_reason = Some("patient declined".into());
        finalize(&conn, &noon, &nurse, Role::Rn, &refused, dt("2026-03-02 12:05:00")).unwrap();
        let _ = evening; // stays pending

        let mar = patient_mar(
            &conn,
            &patient,
            dt("2026-03-02 00:00:00"),
            dt("2026-03-02 23:59:59"),
        )
        .unwrap();

        assert_eq!(mar.entries.len(), 1);
        let entry = &mar.entries[0];
        assert_eq!(entry.records.len(), 3);
        assert_eq!(entry.given_count, 1);
        assert_eq!(entry.missed_count, 1);
    }

    #[test]
    fn window_excludes_out_of_range_records() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let order_id = seed_order(&conn, patient);

        seed_pending(&conn, order_id, patient, "2026-03-01 08:00:00");
        seed_pending(&conn, order_id, patient, "2026-03-02 08:00:00");
        seed_pending(&conn, order_id, patient, "2026-03-03 08:00:00");

        let mar = patient_mar(
            &conn,
            &patient,
            dt("2026-03-02 00:00:00"),
            dt("2026-03-02 23:59:59"),
        )
        .unwrap();
        assert_eq!(mar.entries[0].records.len(), 1);
    }

    #[test]
    fn orders_without_records_still_appear() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        seed_order(&conn, patient);
        seed_order_with(&conn, patient, |o| o.name = "Warfarin".into());

        let mar = patient_mar(
            &conn,
            &patient,
            dt("2026-03-02 00:00:00"),
            dt("2026-03-02 23:59:59"),
        )
        .unwrap();
        assert_eq!(mar.entries.len(), 2);
        assert!(mar.entries.iter().all(|e| e.records.is_empty()));
    }

    #[test]
    fn mar_serializes_for_the_presentation_layer() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let order_id = seed_order(&conn, patient);
        seed_pending(&conn, order_id, patient, "2026-03-02 08:00:00");

        let mar = patient_mar(
            &conn,
            &patient,
            dt("2026-03-02 00:00:00"),
            dt("2026-03-02 23:59:59"),
        )
        .unwrap();

        let json = serde_json::to_value(&mar).unwrap();
        assert_eq!(json["entries"][0]["given_count"], 0);
        assert_eq!(json["entries"][0]["order"]["name"], "Amlodipine");
        assert_eq!(json["entries"][0]["records"][0]["status"], "Pending");
    }

    #[test]
    fn empty_for_unknown_patient() {
        let conn = open_memory_database().unwrap();
        let mar = patient_mar(
            &conn,
            &Uuid::new_v4(),
            dt("2026-03-02 00:00:00"),
            dt("2026-03-02 23:59:59"),
        )
        .unwrap();
        assert!(mar.entries.is_empty());
    }
}
