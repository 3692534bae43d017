//! Session-specific error types for the results core.
//!
//! Separate from the model-level DecodeError so the wire enums stay
//! decoupled from the session lifecycle.

use thiserror::Error;

use crate::models::ResultCategory;

/// Errors surfaced by [`super::session::ResultsSession`].
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Fetch failed for {category:?}: {message}")]
    Fetch {
        category: ResultCategory,
        message: String,
    },

    #[error("Channel open failed: {0}")]
    ChannelOpen(String),

    #[error("No patient session is open")]
    NotOpen,

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Session state lock poisoned")]
    LockPoisoned,
}

/// Error from the results client boundary (transport is opaque here).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream rejected the query: {0}")]
    Rejected(String),
}

/// Failure to register on the event bus or join the push room.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ChannelError(pub String);

impl From<ChannelError> for SessionError {
    fn from(err: ChannelError) -> Self {
        SessionError::ChannelOpen(err.0)
    }
}
