use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured pre-administration findings tied to one administration
/// attempt. Created fresh per attempt and never reused across attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSnapshot {
    pub id: Uuid,
    pub record_id: Uuid,
    pub heart_rate: Option<i32>,
    pub bp_systolic: Option<i32>,
    pub bp_diastolic: Option<i32>,
    pub visual_disturbance: bool,
    pub gi_upset: bool,
    pub dizziness: bool,
    pub bleeding_or_bruising: bool,
    /// Explicit caregiver attestation that the findings were collected for
    /// this attempt. Absence of verification is itself blocking.
    pub verified: bool,
    pub observed_at: NaiveDateTime,
}

impl AssessmentSnapshot {
    /// A blank snapshot for the given attempt; all findings unset,
    /// unverified until the caregiver attests.
    pub fn new(record_id: Uuid, observed_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            record_id,
            heart_rate: None,
            bp_systolic: None,
            bp_diastolic: None,
            visual_disturbance: false,
            gi_upset: false,
            dizziness: false,
            bleeding_or_bruising: false,
            verified: false,
            observed_at,
        }
    }
}
