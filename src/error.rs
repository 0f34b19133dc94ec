// src/error.rs

//! Error taxonomy for the ORION core.
//!
//! Storage-side failures (`Persistence`, `Validation`) are recovered locally
//! by the memory store and never cross the core boundary. Only the session
//! controller surfaces errors to the caller, and only the collaborator-facing
//! kinds (`Collaborator`, `Timeout`, `Cancelled`).

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrionError {
    /// Store read/write failure. Recovered locally; callers see defaults.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Malformed persisted record. Recovered locally with the tier default.
    #[error("invalid persisted record: {0}")]
    Validation(String),

    /// Completion collaborator reported a failure (transport, rate limit, API error).
    #[error("completion failed: {0}")]
    Collaborator(String),

    /// Bounded wait on the completion collaborator exceeded.
    #[error("completion timed out after {0:?}")]
    Timeout(Duration),

    /// The in-flight turn was cancelled before a reply arrived.
    #[error("turn cancelled")]
    Cancelled,
}

impl OrionError {
    /// Whether a UI should offer "retry" (vs "service unavailable") for this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrionError::Timeout(_) | OrionError::Cancelled)
    }
}
