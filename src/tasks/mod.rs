//! Tasks: declarative per-task tables and their loading.
//!
//! Submodules:
//! - `config`: task definitions and the `tasks:` section of the config file
//! - `messages`: fixed participant-facing messages per language
//! - `presets`: built-in task definitions
//! - `errors`: configuration error types

pub mod config;
pub mod errors;
pub mod messages;
pub mod presets;

// Re-exports for convenience
pub use config::{
    load_tasks_config, parse_tasks_config, Framing, ItemSpec, StartGate, TaskConfig, TaskKind,
    TasksConfig,
};
pub use errors::ConfigError;
pub use messages::{Language, MessageOverrides, TaskMessages};
