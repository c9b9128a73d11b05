use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;

use super::format_dt;

/// Append one audit entry for a safety-relevant action.
pub fn insert_audit_entry(
    conn: &Connection,
    timestamp: &NaiveDateTime,
    source: &str,
    action: &str,
    entity: &str,
    user_id: Option<&Uuid>,
    patient_id: Option<&Uuid>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO audit_log (timestamp, source, action, entity, user_id, patient_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            format_dt(timestamp),
            source,
            action,
            entity,
            user_id.map(|u| u.to_string()),
            patient_id.map(|u| u.to_string()),
        ],
    )?;
    Ok(())
}

/// Audit entries touching one patient within the last N days.
/// Returns (timestamp, source, action, entity) tuples, newest first.
pub fn query_audit_by_patient(
    conn: &Connection,
    patient_id: &Uuid,
    days: i64,
) -> Result<Vec<(String, String, String, String)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT timestamp, source, action, entity FROM audit_log
         WHERE patient_id = ?1 AND timestamp >= datetime('now', ?2)
         ORDER BY timestamp DESC",
    )?;
    let rows = stmt
        .query_map(params![patient_id.to_string(), format!("-{days} days")], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Prune audit entries older than the given number of days.
pub fn prune_audit_log(conn: &Connection, retention_days: i64) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM audit_log WHERE timestamp < datetime('now', ?1)",
        params![format!("-{retention_days} days")],
    )?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::Utc;

    #[test]
    fn insert_and_query_by_patient() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let nurse = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        insert_audit_entry(
            &conn,
            &now,
            "administration",
            "finalize",
            "AdministrationRecord",
            Some(&nurse),
            Some(&patient),
        )
        .unwrap();
        insert_audit_entry(&conn, &now, "adr", "acknowledge", "AdrAlert", Some(&nurse), None)
            .unwrap();

        let entries = query_audit_by_patient(&conn, &patient, 7).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1, "administration");
        assert_eq!(entries[0].2, "finalize");
    }

    #[test]
    fn prune_removes_nothing_recent() {
        let conn = open_memory_database().unwrap();
        let now = Utc::now().naive_utc();
        insert_audit_entry(&conn, &now, "orders", "hold", "MedicationOrder", None, None).unwrap();

        let deleted = prune_audit_log(&conn, 30).unwrap();
        assert_eq!(deleted, 0);
    }
}
