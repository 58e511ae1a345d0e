//! Error types.
//!
//! Field-level misses never show up here: they resolve to defaults inside the
//! extraction engine. "No next page" is not an error either.

use thiserror::Error;

/// Durable store read or write failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state store encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

/// Failure talking to the host page
#[derive(Debug, Error)]
#[error("{context}: {message}")]
pub struct HostError {
    pub context: String,
    pub message: String,
}

impl HostError {
    pub fn new(context: impl Into<String>, message: impl ToString) -> Self {
        Self {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

/// Errors surfaced by the session and the collection state machine
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Results container not found")]
    ContainerNotFound,

    #[error("Collection already in progress. Please wait.")]
    AlreadyCollecting,

    #[error("Sorting is disabled")]
    Disabled,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Host(#[from] HostError),
}
