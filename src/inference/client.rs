//! OpenAI-compatible completion client.
//!
//! Sends non-streaming chat completion requests to a hosted endpoint
//! (DeepSeek, OpenAI) and returns the reply content. Handles the fallback
//! chain when the current model is unreachable.

use std::future::Future;
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::config::{ModelConfig, ModelsConfig};
use super::errors::CompletionError;
use super::types::{ChatCompletionRequest, ChatMessage, ReplyContent, SamplingOverrides};

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ─── Service Seam ────────────────────────────────────────────────────────────

/// Anything that can turn a conversation into the next assistant reply.
///
/// The session runner only depends on this trait; tests drive it with a
/// scripted implementation.
pub trait CompletionService {
    fn complete(
        &mut self,
        messages: &[ChatMessage],
        sampling: SamplingOverrides,
    ) -> impl Future<Output = Result<ReplyContent, CompletionError>> + Send;
}

// ─── InferenceClient ─────────────────────────────────────────────────────────

/// Client for the hosted completion endpoint.
pub struct InferenceClient {
    http: HttpClient,
    /// The full models configuration (for the fallback chain).
    config: ModelsConfig,
    current_model_key: String,
    current_model: ModelConfig,
    /// Models that have already been tried and failed.
    exhausted_models: Vec<String>,
}

impl InferenceClient {
    /// Create a client from the models configuration.
    ///
    /// Resolves the active model from config. Does NOT check connectivity;
    /// that happens on the first request.
    pub fn from_config(config: ModelsConfig) -> Result<Self, CompletionError> {
        let (key, model) = super::config::resolve_active_model(&config)?;

        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CompletionError::ConnectionFailed {
                endpoint: model.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            config,
            current_model_key: key,
            current_model: model,
            exhausted_models: Vec::new(),
        })
    }

    /// The display name of the currently selected model.
    pub fn current_model_name(&self) -> &str {
        &self.current_model.display_name
    }

    // ─── Chat Completion ─────────────────────────────────────────────────

    /// Send a chat completion request, walking the fallback chain on
    /// retriable failures.
    pub async fn chat_completion(
        &mut self,
        messages: &[ChatMessage],
        sampling: SamplingOverrides,
    ) -> Result<ReplyContent, CompletionError> {
        let mut last_error: Option<CompletionError> = None;

        for _attempt in 0..=self.remaining_fallbacks() {
            match self.try_request(messages, sampling).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retriable() => {
                    tracing::warn!(
                        model = %self.current_model_key,
                        error = %e,
                        "completion request failed, trying fallback"
                    );
                    last_error = Some(e);
                    if self.try_next_fallback().is_err() {
                        break;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(CompletionError::AllModelsUnavailable {
            attempted: self.exhausted_models.clone(),
        }))
    }

    /// Attempt a single request to the current model.
    async fn try_request(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingOverrides,
    ) -> Result<ReplyContent, CompletionError> {
        let url = format!(
            "{}/chat/completions",
            self.current_model.base_url.trim_end_matches('/')
        );
        let body = ChatCompletionRequest {
            model: self
                .current_model
                .model_name
                .clone()
                .unwrap_or_else(|| self.current_model_key.clone()),
            messages: messages.to_vec(),
            temperature: sampling
                .temperature
                .unwrap_or(self.current_model.temperature),
            max_tokens: Some(sampling.max_tokens.unwrap_or(self.current_model.max_tokens)),
            stream: false,
        };

        tracing::info!(
            url = %url,
            model = %body.model,
            message_count = body.messages.len(),
            max_tokens = ?body.max_tokens,
            "=== COMPLETION REQUEST ==="
        );

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = self.current_model.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout {
                    duration_secs: REQUEST_TIMEOUT.as_secs(),
                }
            } else {
                CompletionError::ConnectionFailed {
                    endpoint: url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(CompletionError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| CompletionError::MalformedResponse {
                reason: format!("failed to read response body: {e}"),
            })?;

        parse_completion_body(&body_text)
    }

    // ─── Fallback Chain ──────────────────────────────────────────────────

    /// Move to the next model in the fallback chain.
    ///
    /// Returns `Err` if no more fallbacks are available.
    pub fn try_next_fallback(&mut self) -> Result<(), CompletionError> {
        if !self.exhausted_models.contains(&self.current_model_key) {
            self.exhausted_models.push(self.current_model_key.clone());
        }

        for key in &self.config.fallback_chain {
            if self.exhausted_models.contains(key) {
                continue;
            }
            if let Some(model) = self.config.models.get(key) {
                self.current_model_key = key.clone();
                self.current_model = model.clone();
                return Ok(());
            }
        }

        Err(CompletionError::AllModelsUnavailable {
            attempted: self.exhausted_models.clone(),
        })
    }

    /// Number of fallback models not yet tried.
    fn remaining_fallbacks(&self) -> usize {
        self.config
            .fallback_chain
            .iter()
            .filter(|k| !self.exhausted_models.contains(k) && **k != self.current_model_key)
            .filter(|k| self.config.models.contains_key(k.as_str()))
            .count()
    }
}

impl CompletionService for InferenceClient {
    async fn complete(
        &mut self,
        messages: &[ChatMessage],
        sampling: SamplingOverrides,
    ) -> Result<ReplyContent, CompletionError> {
        self.chat_completion(messages, sampling).await
    }
}

// ─── Response Parsing ────────────────────────────────────────────────────────

/// Extract the first choice's content from a chat completion body.
///
/// `null` or missing content is an empty text reply, not an error.
pub fn parse_completion_body(body: &str) -> Result<ReplyContent, CompletionError> {
    #[derive(Deserialize)]
    struct CompletionResponse {
        choices: Vec<CompletionChoice>,
    }

    #[derive(Deserialize)]
    struct CompletionChoice {
        message: CompletionMessage,
    }

    #[derive(Deserialize)]
    struct CompletionMessage {
        #[serde(default)]
        content: Option<ReplyContent>,
    }

    let resp: CompletionResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::MalformedResponse {
            reason: format!("failed to parse completion response: {e}"),
        })?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or(CompletionError::MalformedResponse {
            reason: "empty choices array".into(),
        })?;

    Ok(choice.message.content.unwrap_or_default())
}

// ─── Unconfigured Service ────────────────────────────────────────────────────

/// Stand-in used when no models section is configured.
///
/// Every call fails with a config error, which the runner turns into the
/// task's "unknown error" reply.
pub struct UnconfiguredService {
    reason: String,
}

impl UnconfiguredService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl CompletionService for UnconfiguredService {
    async fn complete(
        &mut self,
        _messages: &[ChatMessage],
        _sampling: SamplingOverrides,
    ) -> Result<ReplyContent, CompletionError> {
        Err(CompletionError::ConfigError {
            reason: self.reason.clone(),
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
