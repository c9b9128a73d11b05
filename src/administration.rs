//! Administration recorder — the finalize state machine.
//!
//! One record per dose opportunity moves from `pending` to exactly one
//! terminal status. Every gate is re-checked at finalize time against
//! explicit identity; the backing store serializes concurrent attempts so
//! at most one finalize wins and the loser gets `Conflict`. Terminal
//! records never change; corrections are new records that point back at
//! the original.

use std::fmt;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::adr;
use crate::assessment_gate::{self, GateVerdict};
use crate::db::repository::{
    finalize_pending, get_order, get_record, insert_audit_entry, insert_record, insert_snapshot,
    FinalizeUpdate,
};
use crate::db::DatabaseError;
use crate::dosing;
use crate::models::enums::{AdministrationStatus, OrderStatus, Role};
use crate::models::{AdministrationRecord, AdrAlert, AssessmentSnapshot};
use crate::permissions;

/// The specific safety condition that stopped a finalize attempt.
#[derive(Debug, Clone, Serialize)]
pub enum SafetyBlock {
    /// ADR alerts this user has not (validly) acknowledged.
    AdrAlerts {
        unacknowledged: Vec<AdrAlert>,
        expired: Vec<AdrAlert>,
    },
    /// The order is not active; giving from it is blocked.
    OrderInactive {
        status: OrderStatus,
        hold_reason: Option<String>,
    },
    /// The drug class requires an assessment and none was collected.
    AssessmentMissing,
    /// The assessment gate recommended holding, or the findings were
    /// never verified.
    AssessmentBlocked { reasons: Vec<String> },
}

impl fmt::Display for SafetyBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdrAlerts {
                unacknowledged,
                expired,
            } => write!(
                f,
                "{} unacknowledged and {} expired ADR acknowledgment(s)",
                unacknowledged.len(),
                expired.len()
            ),
            Self::OrderInactive { status, hold_reason } => match hold_reason {
                Some(reason) => write!(f, "order is {}: {reason}", status.as_str()),
                None => write!(f, "order is {}", status.as_str()),
            },
            Self::AssessmentMissing => {
                write!(f, "pre-administration assessment required but not collected")
            }
            Self::AssessmentBlocked { reasons } => {
                write!(f, "assessment recommends hold: {}", reasons.join("; "))
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum AdministerError {
    #[error("role {0:?} may not administer medications")]
    NotAuthorized(Role),

    #[error("administration blocked: {0}")]
    SafetyGateBlocked(SafetyBlock),

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("record {0} is already finalized")]
    Conflict(Uuid),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

fn validation(field: &str, message: &str) -> AdministerError {
    AdministerError::Validation {
        field: field.into(),
        message: message.into(),
    }
}

/// Everything the caregiver's form submits for one finalize attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct FinalizePayload {
    /// Target terminal status.
    pub status: AdministrationStatus,
    pub dose_given: Option<String>,
    pub not_given_reason: Option<String>,
    pub prn_reason: Option<String>,
    pub witness_id: Option<Uuid>,
    pub notes: Option<String>,
    /// Fresh snapshot collected for this attempt, when one was taken.
    pub assessment: Option<AssessmentSnapshot>,
    /// Measured blood glucose in mg/dL, for sliding-scale orders.
    pub blood_glucose: Option<u32>,
    /// Explicit caregiver confirmation of the computed sliding-scale dose.
    pub dose_verified: bool,
}

impl FinalizePayload {
    /// A bare payload targeting `status`; fill in the rest per the order's
    /// requirements.
    pub fn new(status: AdministrationStatus) -> Self {
        Self {
            status,
            dose_given: None,
            not_given_reason: None,
            prn_reason: None,
            witness_id: None,
            notes: None,
            assessment: None,
            blood_glucose: None,
            dose_verified: false,
        }
    }
}

/// Finalize one pending administration record.
///
/// Preconditions, checked in order and short-circuiting on the first
/// failure: already-terminal, capability, form validation, the ADR gate
/// (for every target status), the order-hold gate, the assessment gate,
/// and the sliding-scale verification. On success the record transitions
/// atomically; a concurrent attempt that loses the transition guard gets
/// `Conflict` and the stored record is untouched.
pub fn finalize(
    conn: &Connection,
    record_id: &Uuid,
    user_id: &Uuid,
    role: Role,
    payload: &FinalizePayload,
    now: NaiveDateTime,
) -> Result<AdministrationRecord, AdministerError> {
    let record = get_record(conn, record_id)?;

    // A terminal record has no transitions at all; nothing else is worth
    // checking because no caller state could make this succeed.
    if record.status.is_terminal() {
        return Err(AdministerError::Conflict(*record_id));
    }

    if !permissions::can_administer(role) {
        return Err(AdministerError::NotAuthorized(role));
    }

    if !payload.status.is_terminal() {
        return Err(validation("status", "target status must be terminal"));
    }

    let order = get_order(conn, &record.order_id)?;

    if payload.status != AdministrationStatus::Given
        && payload
            .not_given_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .is_none()
    {
        return Err(validation(
            "not_given_reason",
            "required when the dose is not given",
        ));
    }
    if order.is_prn
        && payload.status == AdministrationStatus::Given
        && payload
            .prn_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .is_none()
    {
        return Err(validation("prn_reason", "required for PRN medications"));
    }

    // ADR gate applies to every target status: refusing or holding a dose
    // still requires current awareness of the patient's alerts.
    let check = adr::check_can_administer(conn, &record.patient_id, user_id, now)?;
    if !check.allowed {
        return Err(AdministerError::SafetyGateBlocked(SafetyBlock::AdrAlerts {
            unacknowledged: check.unacknowledged,
            expired: check.expired,
        }));
    }

    if payload.status == AdministrationStatus::Given && order.status != OrderStatus::Active {
        return Err(AdministerError::SafetyGateBlocked(SafetyBlock::OrderInactive {
            status: order.status,
            hold_reason: order.hold_reason.clone(),
        }));
    }

    if payload.status == AdministrationStatus::Given && assessment_gate::requires_assessment(&order)
    {
        let snapshot = payload
            .assessment
            .as_ref()
            .ok_or(AdministerError::SafetyGateBlocked(SafetyBlock::AssessmentMissing))?;
        if snapshot.record_id != record.id {
            return Err(validation(
                "assessment",
                "snapshot was collected for a different attempt",
            ));
        }

        let outcome = assessment_gate::evaluate(&order, snapshot);
        let mut reasons = outcome.reasons;
        if !snapshot.verified && !reasons.iter().any(|r| r.contains("not verified")) {
            reasons.push("assessment findings not verified by caregiver".into());
        }
        if outcome.verdict == GateVerdict::HoldRecommended || !snapshot.verified {
            return Err(AdministerError::SafetyGateBlocked(
                SafetyBlock::AssessmentBlocked { reasons },
            ));
        }
    }

    let mut dose_given = payload.dose_given.clone();
    if payload.status == AdministrationStatus::Given && order.is_sliding_scale {
        let bg = payload
            .blood_glucose
            .ok_or_else(|| validation("blood_glucose", "required for sliding-scale orders"))?;
        // Verification is mandatory regardless of computed magnitude,
        // 0-unit doses included.
        if !payload.dose_verified {
            return Err(validation(
                "dose_verified",
                "the computed dose must be verified before finalizing",
            ));
        }
        let scale = dosing::dose_for_glucose(bg);
        if dose_given.is_none() {
            dose_given = Some(format!("{} units", scale.units));
        }
        tracing::info!(
            record = %record_id,
            blood_glucose = bg,
            units = scale.units,
            "sliding-scale dose verified"
        );
    }

    let update = FinalizeUpdate {
        status: payload.status,
        dose_given: dose_given.as_deref(),
        administered_by: *user_id,
        administered_role: role,
        finalized_at: now,
        not_given_reason: payload.not_given_reason.as_deref(),
        prn_reason: payload.prn_reason.as_deref(),
        witness_id: payload.witness_id,
        notes: payload.notes.as_deref(),
        assessment_id: payload.assessment.as_ref().map(|s| s.id),
    };

    // The transition guard serializes concurrent finalize attempts; the
    // loser arrives here with every gate passed and still must not write.
    if !finalize_pending(conn, record_id, &update)? {
        return Err(AdministerError::Conflict(*record_id));
    }

    if let Some(snapshot) = &payload.assessment {
        insert_snapshot(conn, snapshot)?;
    }

    insert_audit_entry(
        conn,
        &now,
        "administration",
        "finalize",
        "AdministrationRecord",
        Some(user_id),
        Some(&record.patient_id),
    )?;
    tracing::info!(
        record = %record_id,
        patient = %record.patient_id,
        status = payload.status.as_str(),
        role = role.as_str(),
        "administration record finalized"
    );

    Ok(get_record(conn, record_id)?)
}

/// A compensating record for a terminal one.
#[derive(Debug, Clone, Deserialize)]
pub struct CorrectionPayload {
    pub status: AdministrationStatus,
    pub dose_given: Option<String>,
    pub not_given_reason: Option<String>,
    /// Why the original is wrong. Required.
    pub notes: String,
}

/// Document a correction to an already-finalized record.
///
/// The original is never edited: the correction is a new terminal record
/// cross-referencing it via `corrects_record_id`.
pub fn correct_record(
    conn: &Connection,
    original_id: &Uuid,
    user_id: &Uuid,
    role: Role,
    correction: &CorrectionPayload,
    now: NaiveDateTime,
) -> Result<AdministrationRecord, AdministerError> {
    let original = get_record(conn, original_id)?;
    if !original.status.is_terminal() {
        return Err(validation(
            "record",
            "only a finalized record can be corrected",
        ));
    }

    if !permissions::can_administer(role) {
        return Err(AdministerError::NotAuthorized(role));
    }

    if !correction.status.is_terminal() {
        return Err(validation("status", "correction status must be terminal"));
    }
    if correction.notes.trim().is_empty() {
        return Err(validation(
            "notes",
            "a correction must say what was wrong with the original",
        ));
    }

    let record = AdministrationRecord {
        id: Uuid::new_v4(),
        order_id: original.order_id,
        patient_id: original.patient_id,
        scheduled_time: original.scheduled_time,
        status: correction.status,
        dose_given: correction.dose_given.clone(),
        administered_by: Some(*user_id),
        administered_role: Some(role),
        finalized_at: Some(now),
        not_given_reason: correction.not_given_reason.clone(),
        prn_reason: None,
        witness_id: None,
        notes: Some(correction.notes.clone()),
        assessment_id: None,
        corrects_record_id: Some(*original_id),
        created_at: now,
    };
    insert_record(conn, &record)?;

    insert_audit_entry(
        conn,
        &now,
        "administration",
        "correct",
        "AdministrationRecord",
        Some(user_id),
        Some(&original.patient_id),
    )?;
    tracing::info!(
        correction = %record.id,
        original = %original_id,
        "compensating record created"
    );

    Ok(record)
}
