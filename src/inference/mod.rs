//! Inference: OpenAI-compatible completion service client.
//!
//! This module handles all communication with the hosted model endpoint:
//! - Non-streaming chat completions behind the `CompletionService` seam
//! - Reply content flattening (plain text or typed segments)
//! - Error taxonomy for participant-facing failure replies
//! - Fallback chain management
//! - Model configuration from the models section of `_config/config.yaml`

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

// Re-exports for convenience
pub use client::{CompletionService, InferenceClient, UnconfiguredService};
pub use config::{ModelConfig, ModelsConfig};
pub use errors::{CompletionError, ErrorCategory};
pub use types::{ChatMessage, ReplyContent, Role, SamplingOverrides, Segment};
