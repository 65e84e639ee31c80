//! Error types for mathgen-sync
//!
//! Only these conditions leave the sync engine as failures. Transient page
//! errors are retried inside the engine and remote drift is repaired locally;
//! neither is reported here unless retries run out.

use crate::types::{FetchError, PersonId};
use thiserror::Error;

/// Sync engine error type
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote database has no record with this identifier
    #[error("Unknown identifier {0}: no such record in the remote database")]
    UnknownIdentifier(PersonId),

    /// A transient failure repeated until the attempt ceiling was reached
    #[error("{operation} failed after {attempts} attempt(s): {last_error}")]
    FetchExhausted {
        operation: String,
        attempts: u32,
        last_error: FetchError,
    },

    /// Remote endpoint unreachable or answering with an unexpected status
    #[error("Remote endpoint error: {0}")]
    Unreachable(FetchError),

    /// Invalid caller input (empty name, sentinel identifier)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local store failure
    #[error("Store error: {0}")]
    Store(#[from] mathgen_common::Error),
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        SyncError::Store(mathgen_common::Error::Database(err))
    }
}

impl From<FetchError> for SyncError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound(id) => SyncError::UnknownIdentifier(id),
            FetchError::Parse(_) | FetchError::Transient(_) => SyncError::FetchExhausted {
                operation: "remote request".to_string(),
                attempts: 1,
                last_error: err,
            },
            FetchError::Network(_) | FetchError::Api(..) => SyncError::Unreachable(err),
        }
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
