use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{DrugClass, OrderStatus};

/// A prescribed medication order, owned by the clinical record system.
///
/// The classification flags drive the safety engine: `is_sliding_scale`
/// routes through the dose calculator, `drug_class` through the
/// pre-administration assessment gate, and `is_high_risk` /
/// `is_controlled_substance` mark overdue entries as high risk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationOrder {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub name: String,
    pub dose: String,
    pub route: String,
    pub frequency: String,
    pub drug_class: Option<DrugClass>,
    pub is_prn: bool,
    pub is_controlled_substance: bool,
    pub is_high_risk: bool,
    pub is_sliding_scale: bool,
    pub status: OrderStatus,
    pub hold_reason: Option<String>,
    pub prescriber: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}
