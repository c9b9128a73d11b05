//! Pre-administration clinical assessment gate.
//!
//! Classifies orders by drug class and evaluates a fresh assessment
//! snapshot against class-specific rules. The gate only recommends:
//! proceed and hold-and-document are equal outcomes of one attempt,
//! and the recorder arbitrates between them.

use serde::{Deserialize, Serialize};

use crate::models::enums::DrugClass;
use crate::models::{AssessmentSnapshot, MedicationOrder};

/// Heart rate below this is bradycardia for a cardiac glycoside dose.
const BRADYCARDIA_HEART_RATE: i32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateVerdict {
    Proceed,
    HoldRecommended,
}

/// The gate's recommendation for one administration attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateOutcome {
    pub verdict: GateVerdict,
    pub reasons: Vec<String>,
}

impl GateOutcome {
    fn proceed() -> Self {
        Self {
            verdict: GateVerdict::Proceed,
            reasons: Vec::new(),
        }
    }

    fn hold(reasons: Vec<String>) -> Self {
        Self {
            verdict: GateVerdict::HoldRecommended,
            reasons,
        }
    }
}

/// Whether this order needs a pre-administration assessment at all.
pub fn requires_assessment(order: &MedicationOrder) -> bool {
    matches!(
        order.drug_class,
        Some(DrugClass::CardiacGlycoside)
            | Some(DrugClass::Anticoagulant)
            | Some(DrugClass::Antihypertensive)
    )
}

/// Evaluate a snapshot against the order's drug class.
///
/// Cardiac glycosides hold on bradycardia (HR < 60) and on the toxicity
/// triad (visual disturbance, GI upset, dizziness). Anticoagulants hold
/// on bleeding or bruising. For every other assessment-required class the
/// caregiver's explicit verification is the rule: an unverified snapshot
/// is itself blocking, independent of any numeric finding.
pub fn evaluate(order: &MedicationOrder, snapshot: &AssessmentSnapshot) -> GateOutcome {
    match order.drug_class {
        Some(DrugClass::CardiacGlycoside) => {
            let mut reasons = Vec::new();
            if let Some(hr) = snapshot.heart_rate {
                if hr < BRADYCARDIA_HEART_RATE {
                    reasons.push(format!("bradycardia: heart rate {hr} below 60"));
                }
            }
            if snapshot.visual_disturbance || snapshot.gi_upset || snapshot.dizziness {
                reasons.push("possible toxicity: visual disturbance, GI upset, or dizziness reported".into());
            }
            if reasons.is_empty() {
                GateOutcome::proceed()
            } else {
                GateOutcome::hold(reasons)
            }
        }
        Some(DrugClass::Anticoagulant) => {
            if snapshot.bleeding_or_bruising {
                GateOutcome::hold(vec!["bleeding or unusual bruising observed".into()])
            } else {
                GateOutcome::proceed()
            }
        }
        Some(_) if requires_assessment(order) => {
            if snapshot.verified {
                GateOutcome::proceed()
            } else {
                GateOutcome::hold(vec!["assessment findings not verified by caregiver".into()])
            }
        }
        // Classes without an assessment rule never hold here.
        _ => GateOutcome::proceed(),
    }
}
