//! Repository layer — entity-scoped database operations.
//!
//! Uuids and datetimes are stored as text; datetimes use the
//! `%Y-%m-%d %H:%M:%S` format throughout (UTC by convention).

mod administration;
mod adr;
mod assessment;
mod audit;
mod order;

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::DatabaseError;

pub use administration::*;
pub use adr::*;
pub use assessment::*;
pub use audit::*;
pub use order::*;

pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_dt(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn parse_dt(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("Invalid datetime '{s}': {e}")))
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
