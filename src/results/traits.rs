//! Trait definitions for the collaborators behind the results session.
//!
//! Three traits define the outer boundary:
//! - ResultsClient: bulk category snapshots
//! - EventBus: app-wide broadcast topics
//! - PushChannel: per-patient push room
//!
//! The transport behind each one is deliberately opaque; the session only
//! sees handles and receivers.

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;

use super::error::{ChannelError, FetchError};
use crate::models::{ClinicalResult, ResultCategory};

/// Broadcast topics the session registers for on the event bus.
pub const TOPIC_RESULT_AVAILABLE: &str = "result-available";
pub const TOPIC_CRITICAL_VALUE_ALERT: &str = "critical-value-alert";
pub const TOPIC_RESULT_ACKNOWLEDGED: &str = "result-acknowledged";

/// Push-room event names delivered for a joined patient.
pub const PUSH_OBSERVATION_RECORDED: &str = "observation-recorded";
pub const PUSH_VITAL_SIGNS_RECORDED: &str = "vital-signs-recorded";

/// All bus topics the session cares about.
pub const SESSION_TOPICS: [&str; 3] = [
    TOPIC_RESULT_AVAILABLE,
    TOPIC_CRITICAL_VALUE_ALERT,
    TOPIC_RESULT_ACKNOWLEDGED,
];

/// Opaque registration handle returned by the bus and push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(pub u64);

/// Read access to the clinical results service.
pub trait ResultsClient: Send + Sync {
    /// Fetch the current snapshot of one category for a patient.
    fn fetch(
        &self,
        patient_id: &str,
        category: ResultCategory,
    ) -> BoxFuture<'static, Result<Vec<ClinicalResult>, FetchError>>;
}

/// App-wide broadcast bus carrying result topics.
pub trait EventBus: Send + Sync {
    /// Register for the given topics; events arrive on the returned receiver
    /// as raw JSON envelopes.
    fn register(
        &self,
        patient_id: &str,
        topics: &[&str],
    ) -> Result<(ChannelHandle, mpsc::Receiver<serde_json::Value>), ChannelError>;

    /// Release a registration. Safe to call with an already-released handle.
    fn unregister(&self, handle: ChannelHandle);
}

/// Per-patient push room for category-scoped live updates.
pub trait PushChannel: Send + Sync {
    fn join(
        &self,
        patient_id: &str,
        categories: &[ResultCategory],
    ) -> Result<(ChannelHandle, mpsc::Receiver<serde_json::Value>), ChannelError>;

    fn leave(&self, handle: ChannelHandle);
}
