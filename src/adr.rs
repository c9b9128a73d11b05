//! ADR acknowledgment tracker.
//!
//! Acknowledgment is a personal, shift-scoped attestation: it binds one
//! user to one alert for twelve hours. Two users acknowledge the same
//! alert independently, and the same user re-acknowledges after expiry
//! even if nothing about the alert changed. Never collapse this into a
//! global once-per-alert semantics.

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{
    get_alert, insert_acknowledgment, insert_audit_entry, latest_acknowledgment,
    open_alerts_for_patient, set_alert_status, update_order_status,
};
use crate::db::DatabaseError;
use crate::models::enums::{AcknowledgmentAction, AlertStatus, OrderStatus, Role};
use crate::models::{Acknowledgment, AdrAlert};
use crate::permissions;

/// How long one user's acknowledgment of one alert stays valid.
/// Shift-scoped: after this window the user must re-acknowledge.
pub const ACKNOWLEDGMENT_VALIDITY_HOURS: i64 = 12;

#[derive(Error, Debug)]
pub enum AdrError {
    #[error("role {0:?} may not acknowledge ADR alerts")]
    NotAuthorized(Role),

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("alert {0} is already resolved")]
    AlertResolved(Uuid),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

fn validation(field: &str, message: &str) -> AdrError {
    AdrError::Validation {
        field: field.into(),
        message: message.into(),
    }
}

/// Whether an acknowledgment is still valid at `now`.
///
/// Validity is `created_at + 12h`, computed at check time. There is
/// deliberately no stored expiry flag to go stale.
pub fn is_valid_at(ack: &Acknowledgment, now: NaiveDateTime) -> bool {
    now < ack.created_at + Duration::hours(ACKNOWLEDGMENT_VALIDITY_HOURS)
}

/// Outcome of the pre-administration ADR check for one (patient, user).
#[derive(Debug, Clone, Serialize)]
pub struct AdministerCheck {
    pub allowed: bool,
    pub unacknowledged: Vec<AdrAlert>,
    pub expired: Vec<AdrAlert>,
}

/// Partition the patient's open alerts by this user's acknowledgment state.
///
/// `allowed = false` is a hard stop on the administration flow for this
/// patient, not a warning. Results must be re-evaluated at every attempt;
/// a cached `allowed` crosses the 12-hour boundary unnoticed.
pub fn check_can_administer(
    conn: &Connection,
    patient_id: &Uuid,
    user_id: &Uuid,
    now: NaiveDateTime,
) -> Result<AdministerCheck, DatabaseError> {
    let mut unacknowledged = Vec::new();
    let mut expired = Vec::new();

    for alert in open_alerts_for_patient(conn, patient_id)? {
        match latest_acknowledgment(conn, &alert.id, user_id)? {
            None => unacknowledged.push(alert),
            Some(ack) if !is_valid_at(&ack, now) => expired.push(alert),
            Some(_) => {}
        }
    }

    let allowed = unacknowledged.is_empty() && expired.is_empty();
    if !allowed {
        tracing::warn!(
            patient = %patient_id,
            user = %user_id,
            unacknowledged = unacknowledged.len(),
            expired = expired.len(),
            "ADR check blocked administration"
        );
    }

    Ok(AdministerCheck {
        allowed,
        unacknowledged,
        expired,
    })
}

/// Input collected by the acknowledgment form.
#[derive(Debug, Clone, Deserialize)]
pub struct AcknowledgmentForm {
    pub action: AcknowledgmentAction,
    pub verified_reaction_awareness: bool,
    pub verified_monitoring_parameters: bool,
    pub verified_escalation_criteria: bool,
    pub hold_reason: Option<String>,
    pub hold_duration: Option<String>,
    pub provider_notified: bool,
    pub notes: Option<String>,
}

/// Record one user's acknowledgment of one alert.
///
/// All three verification attestations are required. Choosing
/// `HoldMedication` additionally requires a hold reason, a hold duration,
/// and provider notification, and places the suspected medication order
/// on hold. A `New` alert becomes `Acknowledged` (pending expiry);
/// resolution stays with the upstream surveillance process.
pub fn acknowledge(
    conn: &Connection,
    alert_id: &Uuid,
    user_id: &Uuid,
    role: Role,
    form: &AcknowledgmentForm,
    now: NaiveDateTime,
) -> Result<Acknowledgment, AdrError> {
    if !permissions::can_acknowledge_adr(role) {
        return Err(AdrError::NotAuthorized(role));
    }

    let alert = get_alert(conn, alert_id)?;
    if alert.status == AlertStatus::Resolved {
        return Err(AdrError::AlertResolved(*alert_id));
    }

    if !form.verified_reaction_awareness {
        return Err(validation(
            "verified_reaction_awareness",
            "you must confirm awareness of the suspected reaction",
        ));
    }
    if !form.verified_monitoring_parameters {
        return Err(validation(
            "verified_monitoring_parameters",
            "you must confirm the monitoring parameters",
        ));
    }
    if !form.verified_escalation_criteria {
        return Err(validation(
            "verified_escalation_criteria",
            "you must confirm the escalation criteria",
        ));
    }

    if form.action == AcknowledgmentAction::HoldMedication {
        let hold_reason = form
            .hold_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| validation("hold_reason", "required when holding the medication"))?;
        if form
            .hold_duration
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .is_none()
        {
            return Err(validation(
                "hold_duration",
                "required when holding the medication",
            ));
        }
        if !form.provider_notified {
            return Err(validation(
                "provider_notified",
                "the provider must be notified before a hold",
            ));
        }

        update_order_status(conn, &alert.medication_id, OrderStatus::Held, Some(hold_reason))?;
        tracing::info!(
            order = %alert.medication_id,
            reason = hold_reason,
            "medication order held via ADR acknowledgment"
        );
    }

    let ack = Acknowledgment {
        id: Uuid::new_v4(),
        alert_id: *alert_id,
        user_id: *user_id,
        action: form.action,
        verified_reaction_awareness: true,
        verified_monitoring_parameters: true,
        verified_escalation_criteria: true,
        hold_reason: form.hold_reason.clone(),
        hold_duration: form.hold_duration.clone(),
        provider_notified: form.provider_notified,
        notes: form.notes.clone(),
        created_at: now,
    };
    insert_acknowledgment(conn, &ack)?;

    if alert.status == AlertStatus::New {
        set_alert_status(conn, alert_id, AlertStatus::Acknowledged)?;
    }

    insert_audit_entry(
        conn,
        &now,
        "adr",
        "acknowledge",
        "AdrAlert",
        Some(user_id),
        Some(&alert.patient_id),
    )?;
    tracing::info!(
        alert = %alert_id,
        user = %user_id,
        action = form.action.as_str(),
        "ADR alert acknowledged"
    );

    Ok(ack)
}
