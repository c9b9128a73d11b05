use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AcknowledgmentAction, AlertConfidence, AlertSeverity, AlertStatus};

/// Active surveillance alert for a suspected adverse drug reaction,
/// per (patient, suspected medication) pair. Originated upstream;
/// this client only reads and acknowledges them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdrAlert {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub medication_id: Uuid,
    pub suspected_reaction: String,
    pub summary: String,
    pub severity: AlertSeverity,
    pub confidence: AlertConfidence,
    pub status: AlertStatus,
    pub created_at: NaiveDateTime,
    pub resolved_at: Option<NaiveDateTime>,
}

/// A personal, shift-scoped attestation that one staff member has reviewed
/// one alert. Valid for twelve hours from `created_at`; validity is always
/// computed at check time, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acknowledgment {
    pub id: Uuid,
    pub alert_id: Uuid,
    pub user_id: Uuid,
    pub action: AcknowledgmentAction,
    pub verified_reaction_awareness: bool,
    pub verified_monitoring_parameters: bool,
    pub verified_escalation_criteria: bool,
    pub hold_reason: Option<String>,
    pub hold_duration: Option<String>,
    pub provider_notified: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}
