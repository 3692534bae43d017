//! Update reconciler.
//!
//! Applies one parsed push event against the live store and alert queue.
//! Created events deduplicate by id, Updated events are authoritative, and
//! Acknowledged events only touch the alert queue. Malformed payloads are
//! dropped by the caller via [`parse_envelope`], never propagated.

use super::alerts::AlertQueue;
use super::classify::classify;
use super::error::SessionError;
use super::reference::ReferenceTable;
use super::store::ResultStore;
use crate::models::{ClinicalResult, EventEnvelope, ResultEvent};

/// Decode a raw bus/push payload into an envelope.
pub fn parse_envelope(raw: &serde_json::Value) -> Result<EventEnvelope, SessionError> {
    serde_json::from_value(raw.clone()).map_err(|e| SessionError::MalformedEvent(e.to_string()))
}

/// Merge one event into the session state.
pub fn apply(
    store: &mut ResultStore,
    alerts: &mut AlertQueue,
    table: &ReferenceTable,
    patient_id: &str,
    event: ResultEvent,
) {
    match event {
        ResultEvent::Created { category, result } => {
            if result.category != category {
                tracing::warn!(
                    id = %result.id,
                    routed = category.as_str(),
                    carried = result.category.as_str(),
                    "Dropping created event with mismatched category"
                );
                return;
            }
            if store.contains(result.category, &result.id) {
                tracing::debug!(id = %result.id, "Duplicate created event ignored");
                return;
            }
            merge(store, alerts, table, patient_id, result);
        }
        ResultEvent::Updated { category, result } => {
            if result.category != category {
                tracing::warn!(
                    id = %result.id,
                    routed = category.as_str(),
                    carried = result.category.as_str(),
                    "Dropping updated event with mismatched category"
                );
                return;
            }
            merge(store, alerts, table, patient_id, result);
        }
        ResultEvent::Acknowledged { observation_id } => {
            match alerts.acknowledge(&observation_id) {
                Some(alert) => {
                    tracing::info!(
                        observation_id = %observation_id,
                        alert_id = %alert.id,
                        "Critical alert acknowledged via push"
                    );
                }
                None => {
                    tracing::debug!(
                        observation_id = %observation_id,
                        "Acknowledgment for unknown or already acknowledged alert"
                    );
                }
            }
        }
    }
}

fn merge(
    store: &mut ResultStore,
    alerts: &mut AlertQueue,
    table: &ReferenceTable,
    patient_id: &str,
    result: ClinicalResult,
) {
    let enriched = table.enrich(result);
    // Classify the merged record: the store may hold enrichment the incoming
    // payload lacks.
    let merged = store.upsert(enriched);
    let verdict = classify(&merged);
    if alerts.on_verdict(&merged, verdict, patient_id) {
        tracing::info!(
            id = %merged.id,
            level = verdict.level.as_str(),
            "Critical value alert raised"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ClinicalResult, ReferenceRange, ResultCategory, ResultLifecycle, ResultValue,
    };
    use chrono::Utc;
    use serde_json::json;

    fn potassium(id: &str, magnitude: f64) -> ClinicalResult {
        ClinicalResult {
            id: id.into(),
            category: ResultCategory::Laboratory,
            code: Some("2823-3".into()),
            name: "Potassium".into(),
            value: Some(ResultValue::Quantity {
                magnitude,
                unit: "mmol/L".into(),
            }),
            reference_range: None,
            interpretation: None,
            effective_time: Utc::now(),
            lifecycle: ResultLifecycle::Final,
        }
    }

    fn state() -> (ResultStore, AlertQueue, ReferenceTable) {
        (ResultStore::new(), AlertQueue::new(), ReferenceTable::builtin())
    }

    #[test]
    fn created_enriches_classifies_and_alerts() {
        let (mut store, mut alerts, table) = state();
        // Potassium range 3.5..5.1, margin 0.32, critical above 5.42
        apply(
            &mut store,
            &mut alerts,
            &table,
            "pat-1",
            ResultEvent::Created {
                category: ResultCategory::Laboratory,
                result: potassium("obs-1", 7.2),
            },
        );
        assert!(store.contains(ResultCategory::Laboratory, "obs-1"));
        assert_eq!(alerts.pending().len(), 1);
    }

    #[test]
    fn duplicate_created_is_ignored() {
        let (mut store, mut alerts, table) = state();
        store.upsert(potassium("obs-1", 4.0));

        apply(
            &mut store,
            &mut alerts,
            &table,
            "pat-1",
            ResultEvent::Created {
                category: ResultCategory::Laboratory,
                result: potassium("obs-1", 7.2),
            },
        );
        let snapshot = store.get(ResultCategory::Laboratory);
        assert_eq!(snapshot[0].magnitude(), Some(4.0));
        assert!(alerts.pending().is_empty());
    }

    #[test]
    fn updated_is_authoritative_and_keeps_enrichment() {
        let (mut store, mut alerts, table) = state();
        let mut seeded = potassium("obs-1", 4.0);
        seeded.reference_range = Some(ReferenceRange {
            low: Some(3.5),
            high: Some(5.1),
            unit: Some("mmol/L".into()),
            text: None,
        });
        store.upsert(seeded);

        // The update carries no range and an unenrichable code
        let mut update = potassium("obs-1", 7.2);
        update.code = None;
        apply(
            &mut store,
            &mut alerts,
            &table,
            "pat-1",
            ResultEvent::Updated {
                category: ResultCategory::Laboratory,
                result: update,
            },
        );

        let snapshot = store.get(ResultCategory::Laboratory);
        assert_eq!(snapshot[0].magnitude(), Some(7.2));
        assert!(snapshot[0].reference_range.is_some());
        // Classification ran on the merged record, so the alert fired
        assert_eq!(alerts.pending().len(), 1);
    }

    #[test]
    fn acknowledged_clears_pending_alert() {
        let (mut store, mut alerts, table) = state();
        apply(
            &mut store,
            &mut alerts,
            &table,
            "pat-1",
            ResultEvent::Created {
                category: ResultCategory::Laboratory,
                result: potassium("obs-1", 7.2),
            },
        );
        assert_eq!(alerts.pending().len(), 1);

        apply(
            &mut store,
            &mut alerts,
            &table,
            "pat-1",
            ResultEvent::Acknowledged {
                observation_id: "obs-1".into(),
            },
        );
        assert!(alerts.pending().is_empty());

        // Ack again: no-op
        apply(
            &mut store,
            &mut alerts,
            &table,
            "pat-1",
            ResultEvent::Acknowledged {
                observation_id: "obs-1".into(),
            },
        );
    }

    #[test]
    fn mismatched_category_is_dropped() {
        let (mut store, mut alerts, table) = state();
        apply(
            &mut store,
            &mut alerts,
            &table,
            "pat-1",
            ResultEvent::Created {
                category: ResultCategory::VitalSign,
                result: potassium("obs-1", 4.0),
            },
        );
        assert!(!store.contains(ResultCategory::Laboratory, "obs-1"));
        assert!(!store.contains(ResultCategory::VitalSign, "obs-1"));
    }

    #[test]
    fn malformed_payload_fails_to_parse() {
        let raw = json!({ "type": "created", "category": "laboratory" });
        assert!(matches!(
            parse_envelope(&raw),
            Err(SessionError::MalformedEvent(_))
        ));

        let raw = json!("not even an object");
        assert!(parse_envelope(&raw).is_err());
    }

    #[test]
    fn well_formed_payload_parses() {
        let raw = json!({
            "patient_id": "pat-1",
            "type": "acknowledged",
            "observation_id": "obs-3",
        });
        let envelope = parse_envelope(&raw).unwrap();
        assert_eq!(envelope.patient_id, "pat-1");
    }
}
