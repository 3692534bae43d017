//! Session-scoped results façade.
//!
//! One `ResultsSession` serves one viewer. `open` switches it to a patient:
//! any previous state is torn down, live channels come up (degrading to
//! bulk-only on failure), and the bulk load runs. Every `open` bumps an
//! epoch counter; bulk responses and push events carrying a stale epoch are
//! discarded, which is how a mid-flight patient switch cancels late work.
//!
//! Locking: mutable session state sits behind a std Mutex held only for
//! short non-awaiting sections. Channel handles and the router task sit
//! behind a tokio Mutex because teardown awaits while holding it.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::Receiver;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use super::alerts::AlertQueue;
use super::classify::{self, Verdict};
use super::error::SessionError;
use super::loader::{self, BulkLoadReport, CategoryLoad};
use super::reconcile;
use super::reference::ReferenceTable;
use super::store::{LoadState, ResultStore};
use super::subscription::{self, ChannelLifecycle, OpenChannels};
use super::traits::{EventBus, PushChannel, ResultsClient};
use crate::models::{ClinicalResult, CriticalAlert, ResultCategory};

#[derive(Default)]
struct ChannelState {
    lifecycle: ChannelLifecycle,
    router: Option<JoinHandle<()>>,
}

struct PatientState {
    patient_id: String,
    store: ResultStore,
    alerts: AlertQueue,
    live: bool,
}

impl PatientState {
    fn new(patient_id: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            store: ResultStore::new(),
            alerts: AlertQueue::new(),
            live: false,
        }
    }
}

struct SessionInner {
    epoch: u64,
    patient: Option<PatientState>,
}

pub struct ResultsSession {
    client: Arc<dyn ResultsClient>,
    bus: Arc<dyn EventBus>,
    push: Arc<dyn PushChannel>,
    table: Arc<ReferenceTable>,
    inner: Arc<Mutex<SessionInner>>,
    channels: AsyncMutex<ChannelState>,
}

impl ResultsSession {
    pub fn new(
        client: Arc<dyn ResultsClient>,
        bus: Arc<dyn EventBus>,
        push: Arc<dyn PushChannel>,
    ) -> Self {
        Self::with_table(client, bus, push, ReferenceTable::builtin())
    }

    /// Session with a facility-specific reference table.
    pub fn with_table(
        client: Arc<dyn ResultsClient>,
        bus: Arc<dyn EventBus>,
        push: Arc<dyn PushChannel>,
        table: ReferenceTable,
    ) -> Self {
        Self {
            client,
            bus,
            push,
            table: Arc::new(table),
            inner: Arc::new(Mutex::new(SessionInner {
                epoch: 0,
                patient: None,
            })),
            channels: AsyncMutex::new(ChannelState::default()),
        }
    }

    fn inner(&self) -> Result<MutexGuard<'_, SessionInner>, SessionError> {
        self.inner.lock().map_err(|_| SessionError::LockPoisoned)
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Switch the session to a patient.
    ///
    /// Tears down any previous patient first. A channel-open failure is
    /// logged and the session continues bulk-only; per-category fetch
    /// failures land in the returned report and the bucket's load state.
    pub async fn open(&self, patient_id: &str) -> Result<BulkLoadReport, SessionError> {
        self.close().await;

        let epoch = {
            let mut guard = self.inner()?;
            guard.epoch += 1;
            guard.patient = Some(PatientState::new(patient_id));
            guard.epoch
        };
        tracing::info!(patient_id = %patient_id, epoch, "Opening results session");

        {
            let mut channels = self.channels.lock().await;
            match subscription::open_channels(self.bus.as_ref(), self.push.as_ref(), patient_id) {
                Ok(OpenChannels {
                    lifecycle,
                    bus_rx,
                    push_rx,
                }) => {
                    channels.lifecycle = lifecycle;
                    channels.router =
                        Some(self.spawn_router(patient_id.to_string(), epoch, bus_rx, push_rx));
                    let mut guard = self.inner()?;
                    if let Some(state) = guard.patient.as_mut() {
                        state.live = true;
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        patient_id = %patient_id,
                        %err,
                        "Live channels unavailable, continuing bulk-only"
                    );
                }
            }
        }

        let loads = loader::fetch_all(self.client.as_ref(), &self.table, patient_id).await;
        self.commit_loads(epoch, loads)
    }

    /// Tear the session down: abort the router, release both channel
    /// handles, drop per-patient state. Safe to call when already closed.
    pub async fn close(&self) {
        {
            let mut channels = self.channels.lock().await;
            if let Some(router) = channels.router.take() {
                router.abort();
            }
            let plan = channels.lifecycle.begin_close();
            subscription::release(self.bus.as_ref(), self.push.as_ref(), plan);
            channels.lifecycle.released();
        }
        if let Ok(mut guard) = self.inner.lock() {
            guard.epoch += 1;
            if let Some(state) = guard.patient.take() {
                tracing::info!(patient_id = %state.patient_id, "Results session closed");
            }
        }
    }

    /// Re-run the bulk fetch for one failed category.
    pub async fn retry(&self, category: ResultCategory) -> Result<(), SessionError> {
        let (patient_id, epoch) = {
            let guard = self.inner()?;
            let state = guard.patient.as_ref().ok_or(SessionError::NotOpen)?;
            (state.patient_id.clone(), guard.epoch)
        };

        let load =
            loader::fetch_one(self.client.as_ref(), &self.table, &patient_id, category).await;

        let mut guard = self.inner()?;
        if guard.epoch != epoch {
            tracing::debug!(category = category.as_str(), "Discarding stale retry");
            return Ok(());
        }
        let state = guard.patient.as_mut().ok_or(SessionError::NotOpen)?;
        match load.outcome {
            Ok(results) => {
                let seeded = state.store.seed(category, results);
                tracing::info!(category = category.as_str(), seeded, "Retry succeeded");
                Ok(())
            }
            Err(err) => {
                state.store.mark_failed(category);
                Err(SessionError::Fetch {
                    category,
                    message: err.to_string(),
                })
            }
        }
    }

    // ── View-facing reads ───────────────────────────────────────────────

    /// Snapshot of one category, newest first. Empty when no session is open.
    pub fn results(&self, category: ResultCategory) -> Result<Vec<ClinicalResult>, SessionError> {
        let guard = self.inner()?;
        Ok(guard
            .patient
            .as_ref()
            .map(|s| s.store.get(category))
            .unwrap_or_default())
    }

    /// Classify a result for display. Pure; does not touch session state.
    pub fn classify(&self, result: &ClinicalResult) -> Verdict {
        classify::classify(result)
    }

    /// Unacknowledged critical alerts, oldest first.
    pub fn pending_alerts(&self) -> Result<Vec<CriticalAlert>, SessionError> {
        let guard = self.inner()?;
        Ok(guard
            .patient
            .as_ref()
            .map(|s| s.alerts.pending())
            .unwrap_or_default())
    }

    /// Acknowledge a pending alert. Returns false when nothing was pending
    /// for that observation, including when no session is open at all.
    pub fn acknowledge(&self, observation_id: &str) -> Result<bool, SessionError> {
        let mut guard = self.inner()?;
        let Some(state) = guard.patient.as_mut() else {
            tracing::debug!(
                observation_id = %observation_id,
                "Acknowledgment with no open session"
            );
            return Ok(false);
        };
        match state.alerts.acknowledge(observation_id) {
            Some(alert) => {
                tracing::info!(
                    observation_id = %observation_id,
                    alert_id = %alert.id,
                    "Critical alert acknowledged"
                );
                Ok(true)
            }
            None => {
                tracing::debug!(
                    observation_id = %observation_id,
                    "Acknowledgment with no pending alert"
                );
                Ok(false)
            }
        }
    }

    pub fn load_state(&self, category: ResultCategory) -> Result<LoadState, SessionError> {
        let guard = self.inner()?;
        Ok(guard
            .patient
            .as_ref()
            .map(|s| s.store.load_state(category))
            .unwrap_or(LoadState::NotLoaded))
    }

    /// Whether live channels are up for the current patient. False means
    /// the view should show its non-blocking stale-data warning.
    pub fn is_live(&self) -> bool {
        self.inner
            .lock()
            .ok()
            .and_then(|g| g.patient.as_ref().map(|s| s.live))
            .unwrap_or(false)
    }

    pub fn patient_id(&self) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|g| g.patient.as_ref().map(|s| s.patient_id.clone()))
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn commit_loads(
        &self,
        epoch: u64,
        loads: Vec<CategoryLoad>,
    ) -> Result<BulkLoadReport, SessionError> {
        let mut guard = self.inner()?;
        if guard.epoch != epoch {
            tracing::debug!(epoch, "Discarding bulk load for a closed epoch");
            return Ok(BulkLoadReport::default());
        }
        let Some(state) = guard.patient.as_mut() else {
            return Ok(BulkLoadReport::default());
        };

        let mut report = BulkLoadReport::default();
        for load in loads {
            match load.outcome {
                Ok(results) => {
                    state.store.seed(load.category, results);
                    report.loaded.push(load.category);
                }
                Err(err) => {
                    state.store.mark_failed(load.category);
                    tracing::warn!(
                        category = load.category.as_str(),
                        %err,
                        "Category fetch failed"
                    );
                    report.failed.push((load.category, err.to_string()));
                }
            }
        }
        tracing::info!(
            patient_id = %state.patient_id,
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Bulk load committed"
        );
        Ok(report)
    }

    fn spawn_router(
        &self,
        patient_id: String,
        epoch: u64,
        bus_rx: Receiver<serde_json::Value>,
        push_rx: Receiver<serde_json::Value>,
    ) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let table = Arc::clone(&self.table);
        tokio::spawn(async move {
            run_router(inner, table, patient_id, epoch, bus_rx, push_rx).await;
        })
    }
}

/// Single consumer of both live receivers. Exits when both senders drop or
/// when the session has moved to a newer epoch.
async fn run_router(
    inner: Arc<Mutex<SessionInner>>,
    table: Arc<ReferenceTable>,
    patient_id: String,
    epoch: u64,
    mut bus_rx: Receiver<serde_json::Value>,
    mut push_rx: Receiver<serde_json::Value>,
) {
    loop {
        let raw = tokio::select! {
            Some(msg) = bus_rx.recv() => msg,
            Some(msg) = push_rx.recv() => msg,
            else => break,
        };

        let envelope = match reconcile::parse_envelope(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(%err, "Dropping malformed event");
                continue;
            }
        };
        if envelope.patient_id != patient_id {
            tracing::debug!(
                got = %envelope.patient_id,
                expected = %patient_id,
                "Dropping event for another patient"
            );
            continue;
        }

        let Ok(mut guard) = inner.lock() else {
            break;
        };
        if guard.epoch != epoch {
            break;
        }
        let Some(state) = guard.patient.as_mut() else {
            break;
        };
        reconcile::apply(
            &mut state.store,
            &mut state.alerts,
            &table,
            &patient_id,
            envelope.event,
        );
    }
    tracing::debug!(patient_id = %patient_id, epoch, "Event router stopped");
}
