use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A critical value awaiting acknowledgment by the viewing clinician.
///
/// Keyed by `observation_id` in the pending queue: at most one
/// unacknowledged alert exists per observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalAlert {
    pub id: Uuid,
    pub observation_id: String,
    pub patient_id: String,
    pub summary: String,
    pub raised_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub critical: bool,
}
