//! Task configuration error types.

use thiserror::Error;

use crate::detection::DetectionError;

/// Errors that can occur while loading or validating task definitions.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    /// The YAML could not be parsed into task definitions.
    #[error("failed to parse task config: {reason}")]
    ParseFailed { reason: String },

    /// No task (file or built-in) has the requested key.
    #[error("unknown task '{key}'")]
    UnknownTask { key: String },

    /// A task definition is structurally wrong.
    #[error("invalid task '{task}': {reason}")]
    InvalidTask { task: String, reason: String },
}

impl ConfigError {
    /// Wrap a detector construction failure with the task it belongs to.
    pub fn from_detection(task: &str, err: DetectionError) -> Self {
        ConfigError::InvalidTask {
            task: task.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::ParseFailed {
            reason: e.to_string(),
        }
    }
}
