//! Sliding-scale insulin dose calculator.
//!
//! A total, pure function of the measured blood glucose. The caregiver must
//! still verify the computed dose before a sliding-scale administration is
//! accepted, including 0-unit results — see the recorder's `dose_verified`
//! requirement.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlucoseClassification {
    /// Hypoglycemic — insulin must not be given.
    CriticalLow,
    /// In target range; no coverage needed.
    Normal,
    /// Covered by a scale tier.
    Correction,
    /// Above the top of the scale — provider notification required.
    CriticalHigh,
}

/// Computed sliding-scale coverage for one glucose reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleDose {
    pub units: u8,
    pub classification: GlucoseClassification,
    pub message: String,
}

/// Sliding-scale coverage for a blood glucose reading in mg/dL.
///
/// Tiers: <70 critical low (0 units), 70–149 in range (0 units), 150–200
/// → 2, 201–250 → 4, 251–300 → 6, 301–350 → 8, 351–400 → 10, >400 → 12
/// with provider notification.
///
/// The 2-unit tier starts at 150 inclusive. Older printed charts labeled
/// this tier "151–200", but the comparison in use has always admitted 150;
/// the comparison is the behavior patients actually received, so 150 stays
/// in the 2-unit tier and every label in this crate reads 150–200.
pub fn dose_for_glucose(bg_mg_dl: u32) -> ScaleDose {
    match bg_mg_dl {
        0..=69 => ScaleDose {
            units: 0,
            classification: GlucoseClassification::CriticalLow,
            message: format!(
                "Blood glucose {bg_mg_dl} mg/dL is critically low. Do not give insulin — \
                 treat hypoglycemia per protocol and notify the provider."
            ),
        },
        70..=149 => ScaleDose {
            units: 0,
            classification: GlucoseClassification::Normal,
            message: format!("Blood glucose {bg_mg_dl} mg/dL is in target range. No coverage needed."),
        },
        150..=200 => correction(bg_mg_dl, 2),
        201..=250 => correction(bg_mg_dl, 4),
        251..=300 => correction(bg_mg_dl, 6),
        301..=350 => correction(bg_mg_dl, 8),
        351..=400 => correction(bg_mg_dl, 10),
        _ => ScaleDose {
            units: 12,
            classification: GlucoseClassification::CriticalHigh,
            message: format!(
                "Blood glucose {bg_mg_dl} mg/dL is critically high. Give 12 units and \
                 notify the provider."
            ),
        },
    }
}

fn correction(bg_mg_dl: u32, units: u8) -> ScaleDose {
    ScaleDose {
        units,
        classification: GlucoseClassification::Correction,
        message: format!("Blood glucose {bg_mg_dl} mg/dL: give {units} units per sliding scale."),
    }
}
