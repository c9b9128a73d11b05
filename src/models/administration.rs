use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AdministrationStatus, Role};

/// One scheduled-or-PRN dose opportunity on the MAR.
///
/// Created as `pending` when the schedule slot is generated; transitions
/// exactly once to a terminal status and is immutable afterwards.
/// Corrections are new records pointing back via `corrects_record_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdministrationRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_time: NaiveDateTime,
    pub status: AdministrationStatus,
    pub dose_given: Option<String>,
    pub administered_by: Option<Uuid>,
    pub administered_role: Option<Role>,
    pub finalized_at: Option<NaiveDateTime>,
    pub not_given_reason: Option<String>,
    pub prn_reason: Option<String>,
    /// Second signature for controlled substances.
    pub witness_id: Option<Uuid>,
    pub notes: Option<String>,
    pub assessment_id: Option<Uuid>,
    pub corrects_record_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
}

impl AdministrationRecord {
    /// A fresh pending slot for the given order.
    pub fn pending(
        order_id: Uuid,
        patient_id: Uuid,
        scheduled_time: NaiveDateTime,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            patient_id,
            scheduled_time,
            status: AdministrationStatus::Pending,
            dose_given: None,
            administered_by: None,
            administered_role: None,
            finalized_at: None,
            not_given_reason: None,
            prn_reason: None,
            witness_id: None,
            notes: None,
            assessment_id: None,
            corrects_record_id: None,
            created_at,
        }
    }
}
