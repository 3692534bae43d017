/// Application-level constants
pub const APP_NAME: &str = "Chartwatch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}

/// Capacity of the mpsc channels carrying raw push events into the router
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Fraction of the reference span added beyond each bound before a value
/// counts as critical (span 70..100 puts the critical bounds at 64 and 106)
pub const CRITICAL_MARGIN_FACTOR: f64 = 0.2;
