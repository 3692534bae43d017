//! Live-consolidated clinical results.
//!
//! Keeps one patient's results fresh under two concurrent update sources,
//! running everything on a single logical thread of mutation.
//!
//! ## Architecture
//! ```text
//! bulk loader ──┐
//!               ├─→ enrich → store → classify → alert queue
//! push router ──┘
//! ```
//!
//! The session façade owns the store and the alert queue; the loader and
//! the router never touch them except through the session's lock. Merge
//! conflicts between the two sources resolve by id-presence (seed) and
//! enrichment preservation (upsert).

pub mod alerts;
pub mod classify;
pub mod error;
pub mod loader;
pub mod reconcile;
pub mod reference;
pub mod session;
pub mod store;
pub mod subscription;
pub mod traits;

pub use alerts::AlertQueue;
pub use classify::{classify, Verdict, VerdictLevel};
pub use error::{ChannelError, FetchError, SessionError};
pub use loader::BulkLoadReport;
pub use reference::{RangeEntry, ReferenceTable};
pub use session::ResultsSession;
pub use store::{LoadState, ResultStore};
pub use traits::{ChannelHandle, EventBus, PushChannel, ResultsClient};
