//! Chat runner error types.

use thiserror::Error;

use crate::store::StoreError;
use crate::tasks::ConfigError;

/// Errors that stop a chat turn.
///
/// Completion-service failures are not here: they become reply text.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The chat log could not be written.
    #[error("log store error: {reason}")]
    StoreFailed { reason: String },

    /// The task could not be loaded.
    #[error("task configuration error: {reason}")]
    TaskUnavailable { reason: String },
}

impl From<StoreError> for ChatError {
    fn from(e: StoreError) -> Self {
        ChatError::StoreFailed {
            reason: e.to_string(),
        }
    }
}

impl From<ConfigError> for ChatError {
    fn from(e: ConfigError) -> Self {
        ChatError::TaskUnavailable {
            reason: e.to_string(),
        }
    }
}
