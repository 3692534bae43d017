//! Chartwatch keeps a unified, de-duplicated view of one patient's clinical
//! results fresh under two concurrent update sources, a bulk initial fetch
//! and a stream of live push events, while classifying every result against
//! a reference range and routing critical values into an
//! acknowledgment-tracked alert flow.

pub mod config;
pub mod models; // Wire-facing data types
pub mod results; // Session core: store, classifier, alerts, channels

pub use models::{ClinicalResult, CriticalAlert, ResultCategory};
pub use results::{ResultsSession, Verdict};

use tracing_subscriber::EnvFilter;

/// Install the process-wide tracing subscriber.
///
/// Respects RUST_LOG, falling back to the crate default filter. Call once
/// at startup.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
