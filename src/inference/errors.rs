//! Completion-service error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. Callers never
//! show these to participants directly: [`CompletionError::category`] maps
//! each one onto the small fixed taxonomy that canned replies are keyed by.

use thiserror::Error;

/// The failure classes a participant can be told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimited,
    Connectivity,
    BadRequest,
    Unknown,
}

/// Errors that can occur while calling the completion service.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// TCP/HTTP connection to the endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The endpoint did not answer within the request timeout.
    #[error("completion timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Non-2xx HTTP response.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// A 2xx response whose body is not a chat completion.
    #[error("malformed completion response: {reason}")]
    MalformedResponse { reason: String },

    /// Every model in the fallback chain failed.
    #[error("all models unavailable (tried: {})", attempted.join(", "))]
    AllModelsUnavailable { attempted: Vec<String> },

    /// Configuration loading or validation error.
    #[error("config error: {reason}")]
    ConfigError { reason: String },
}

impl CompletionError {
    /// Map onto the participant-facing taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CompletionError::HttpError { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimited,
                400 | 413 | 422 => ErrorCategory::BadRequest,
                _ => ErrorCategory::Unknown,
            },
            CompletionError::ConnectionFailed { .. }
            | CompletionError::Timeout { .. }
            | CompletionError::AllModelsUnavailable { .. } => ErrorCategory::Connectivity,
            CompletionError::MalformedResponse { .. } | CompletionError::ConfigError { .. } => {
                ErrorCategory::Unknown
            }
        }
    }

    /// Whether the next model in the fallback chain should be tried.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            CompletionError::ConnectionFailed { .. }
                | CompletionError::Timeout { .. }
                | CompletionError::HttpError {
                    status: 500..=599,
                    ..
                }
        )
    }

    /// Short human-readable detail for templated replies.
    ///
    /// For HTTP errors this prefers the `error.message` field of an
    /// OpenAI-style JSON body over the raw body.
    pub fn detail(&self) -> String {
        match self {
            CompletionError::HttpError { body, .. } => {
                serde_json::from_str::<serde_json::Value>(body)
                    .ok()
                    .and_then(|v| {
                        v.get("error")
                            .and_then(|e| e.get("message"))
                            .and_then(|m| m.as_str())
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| body.trim().to_string())
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, body: &str) -> CompletionError {
        CompletionError::HttpError {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(http(401, "").category(), ErrorCategory::Authentication);
        assert_eq!(http(403, "").category(), ErrorCategory::Authentication);
        assert_eq!(http(429, "").category(), ErrorCategory::RateLimited);
        assert_eq!(http(400, "").category(), ErrorCategory::BadRequest);
        assert_eq!(http(422, "").category(), ErrorCategory::BadRequest);
        assert_eq!(http(404, "").category(), ErrorCategory::Unknown);
        assert_eq!(http(503, "").category(), ErrorCategory::Unknown);
        assert_eq!(
            CompletionError::Timeout { duration_secs: 60 }.category(),
            ErrorCategory::Connectivity
        );
        assert_eq!(
            CompletionError::MalformedResponse { reason: "x".into() }.category(),
            ErrorCategory::Unknown
        );
    }

    #[test]
    fn test_is_retriable() {
        assert!(CompletionError::ConnectionFailed {
            endpoint: "".into(),
            reason: "".into()
        }
        .is_retriable());
        assert!(CompletionError::Timeout { duration_secs: 5 }.is_retriable());
        assert!(http(500, "").is_retriable());
        assert!(http(503, "").is_retriable());
        assert!(!http(400, "").is_retriable());
        assert!(!http(401, "").is_retriable());
        assert!(!http(429, "").is_retriable());
    }

    #[test]
    fn test_detail_prefers_json_message() {
        let err = http(
            400,
            r#"{"error":{"message":"max_tokens is too large","type":"invalid_request_error"}}"#,
        );
        assert_eq!(err.detail(), "max_tokens is too large");
        assert_eq!(http(400, " plain body \n").detail(), "plain body");
    }
}
