use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Interpretation, ResultCategory, ResultLifecycle};

/// Measured value of a clinical result. Pending results carry none at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultValue {
    Quantity { magnitude: f64, unit: String },
    Text { text: String },
}

/// Expected range for a coded observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub unit: Option<String>,
    /// Human-readable form, e.g. "70 — 100 mg/dL".
    pub text: Option<String>,
}

/// One observation as consolidated in the session store.
///
/// `id` is the upstream observation identifier and is unique within a
/// category bucket. `code` is the LOINC code when the source supplied one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalResult {
    pub id: String,
    pub category: ResultCategory,
    pub code: Option<String>,
    pub name: String,
    pub value: Option<ResultValue>,
    pub reference_range: Option<ReferenceRange>,
    pub interpretation: Option<Interpretation>,
    pub effective_time: DateTime<Utc>,
    pub lifecycle: ResultLifecycle,
}

impl ClinicalResult {
    /// Numeric magnitude when the value is a quantity.
    pub fn magnitude(&self) -> Option<f64> {
        match &self.value {
            Some(ResultValue::Quantity { magnitude, .. }) => Some(*magnitude),
            _ => None,
        }
    }
}
