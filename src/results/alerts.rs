//! Critical value alert queue.
//!
//! One unacknowledged alert per observation id: a verdict that is still
//! critical while an alert is pending does not fire again. After an
//! acknowledgment the id may fire anew if a later update is critical again.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::classify::Verdict;
use crate::models::{ClinicalResult, CriticalAlert, ResultValue};

#[derive(Debug, Default)]
pub struct AlertQueue {
    pending: HashMap<String, CriticalAlert>,
}

impl AlertQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an alert for a critical verdict. Returns true when a new alert
    /// was raised, false for non-critical verdicts and already-pending ids.
    pub fn on_verdict(
        &mut self,
        result: &ClinicalResult,
        verdict: Verdict,
        patient_id: &str,
    ) -> bool {
        if !verdict.critical || self.pending.contains_key(&result.id) {
            return false;
        }
        let alert = CriticalAlert {
            id: Uuid::new_v4(),
            observation_id: result.id.clone(),
            patient_id: patient_id.to_string(),
            summary: summary_line(result, verdict),
            raised_at: Utc::now(),
            acknowledged_at: None,
            critical: true,
        };
        self.pending.insert(result.id.clone(), alert);
        true
    }

    /// Acknowledge the pending alert for an observation, stamping it and
    /// removing it from the queue. Unknown or already-acknowledged ids are a
    /// no-op returning None.
    pub fn acknowledge(&mut self, observation_id: &str) -> Option<CriticalAlert> {
        let mut alert = self.pending.remove(observation_id)?;
        alert.acknowledged_at = Some(Utc::now());
        Some(alert)
    }

    /// Unacknowledged alerts, oldest first.
    pub fn pending(&self) -> Vec<CriticalAlert> {
        let mut alerts: Vec<CriticalAlert> = self.pending.values().cloned().collect();
        alerts.sort_by(|a, b| a.raised_at.cmp(&b.raised_at).then_with(|| a.id.cmp(&b.id)));
        alerts
    }
}

fn summary_line(result: &ClinicalResult, verdict: Verdict) -> String {
    let value = match &result.value {
        Some(ResultValue::Quantity { magnitude, unit }) => format!("{magnitude} {unit}"),
        Some(ResultValue::Text { text }) => text.clone(),
        None => "no value".to_string(),
    };
    format!("{} {} ({})", result.name, value, verdict.level.as_str())
}
