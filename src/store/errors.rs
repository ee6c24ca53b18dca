//! Log store error types.

use thiserror::Error;

/// Errors that can occur while reading or writing the chat log.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite operation failed.
    #[error("database error: {reason}")]
    DatabaseError { reason: String },

    /// A final result could not be encoded or decoded.
    #[error("serialization error: {reason}")]
    SerializationError { reason: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError {
            reason: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::SerializationError {
            reason: e.to_string(),
        }
    }
}
