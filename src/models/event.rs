use serde::{Deserialize, Serialize};

use super::enums::ResultCategory;
use super::result::ClinicalResult;

/// Live update pushed over the event bus or the patient push room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultEvent {
    /// A new observation was recorded.
    Created {
        category: ResultCategory,
        result: ClinicalResult,
    },
    /// An existing observation changed (corrected, finalized, amended).
    /// Authoritative over whatever the store currently holds.
    Updated {
        category: ResultCategory,
        result: ClinicalResult,
    },
    /// A critical value was acknowledged elsewhere (another workstation).
    Acknowledged { observation_id: String },
}

/// Wire envelope around a [`ResultEvent`]. The router drops envelopes whose
/// `patient_id` does not match the open session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub patient_id: String,
    #[serde(flatten)]
    pub event: ResultEvent,
}
