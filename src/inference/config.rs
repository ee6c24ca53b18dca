//! Model configuration loading and validation.
//!
//! Reads the models section of `_config/config.yaml` after environment
//! interpolation. Config is the single source of truth for endpoints, API
//! keys, sampling defaults and the fallback chain.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::errors::CompletionError;

// ─── Public Types ────────────────────────────────────────────────────────────

/// A single model's runtime configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    pub display_name: String,
    /// OpenAI-compatible base URL, e.g. `https://api.deepseek.com`.
    pub base_url: String,
    /// Model name sent in requests; defaults to the config key.
    #[serde(default)]
    pub model_name: Option<String>,
    /// Bearer token. Usually `${SOME_API_KEY}` in the file.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    400
}

/// Model registry (the models section of the config file).
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    pub active_model: String,
    pub models: HashMap<String, ModelConfig>,
    #[serde(default)]
    pub fallback_chain: Vec<String>,
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Parse the models section from already-interpolated YAML text.
pub fn parse_models_config(yaml: &str) -> Result<ModelsConfig, CompletionError> {
    serde_yaml::from_str(yaml).map_err(|e| CompletionError::ConfigError {
        reason: format!("failed to parse models config: {e}"),
    })
}

/// Load and parse the models section of a config file.
pub fn load_models_config(path: &Path) -> Result<ModelsConfig, CompletionError> {
    let text = crate::config::read_interpolated(path).map_err(|e| CompletionError::ConfigError {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;
    parse_models_config(&text)
}

/// Resolve the active model, falling back along the chain when the active
/// key is missing from `models`.
pub fn resolve_active_model(
    config: &ModelsConfig,
) -> Result<(String, ModelConfig), CompletionError> {
    if let Some(model) = config.models.get(&config.active_model) {
        return Ok((config.active_model.clone(), model.clone()));
    }

    for key in &config.fallback_chain {
        if let Some(model) = config.models.get(key) {
            return Ok((key.clone(), model.clone()));
        }
    }

    Err(CompletionError::ConfigError {
        reason: format!(
            "active model '{}' not found in config and no fallback available",
            config.active_model
        ),
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
active_model: deepseek
models:
  deepseek:
    display_name: "DeepSeek Chat"
    base_url: "https://api.deepseek.com"
    model_name: deepseek-chat
    api_key: "sk-test"
  gpt4o:
    display_name: "GPT-4o"
    base_url: "https://api.openai.com/v1"
    temperature: 0.5
    max_tokens: 800
fallback_chain: [deepseek, gpt4o]
tasks: {}
"#;

    #[test]
    fn test_parse_models_with_defaults() {
        let config = parse_models_config(YAML).unwrap();
        let deepseek = &config.models["deepseek"];
        assert_eq!(deepseek.max_tokens, 400);
        assert!((deepseek.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(deepseek.api_key.as_deref(), Some("sk-test"));

        let gpt = &config.models["gpt4o"];
        assert_eq!(gpt.max_tokens, 800);
        assert!(gpt.model_name.is_none());
    }

    #[test]
    fn test_resolve_active_model() {
        let config = parse_models_config(YAML).unwrap();
        let (key, model) = resolve_active_model(&config).unwrap();
        assert_eq!(key, "deepseek");
        assert_eq!(model.display_name, "DeepSeek Chat");
    }

    #[test]
    fn test_resolve_walks_fallback_chain() {
        let mut config = parse_models_config(YAML).unwrap();
        config.active_model = "missing".into();
        let (key, _) = resolve_active_model(&config).unwrap();
        assert_eq!(key, "deepseek");
    }

    #[test]
    fn test_resolve_active_model_not_found() {
        let config = ModelsConfig {
            active_model: "nonexistent".into(),
            models: HashMap::new(),
            fallback_chain: vec![],
        };
        assert!(resolve_active_model(&config).is_err());
    }

    #[test]
    fn test_missing_models_section_is_config_error() {
        let err = parse_models_config("tasks: {}\n").unwrap_err();
        assert!(matches!(err, CompletionError::ConfigError { .. }));
    }
}
