//! Error types for the signal lifecycle.

use std::time::Duration;
use thiserror::Error;

/// Failures reported by a [`crate::store::SignalStore`].
///
/// Backend errors are flattened to text here so nothing past the store
/// boundary depends on the storage driver's error type.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate dedup key: {0}")]
    DuplicateKey(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt signal row {id}: {reason}")]
    CorruptRow { id: String, reason: String },
}

impl StoreError {
    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Timeout(_) | StoreError::Unavailable(_))
    }
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Ingestion failures. Rejections and duplicates are outcomes, not errors.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required field: {0}")]
    Caller(&'static str),

    #[error(transparent)]
    Store(StoreError),
}

/// Dispatch failures. An empty queue is an outcome, not an error.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("missing required parameter: {0}")]
    Caller(&'static str),

    #[error("claim contention exhausted {attempts} attempts")]
    Busy { attempts: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}
