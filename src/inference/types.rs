//! Shared types for the completion client.
//!
//! These mirror the OpenAI Chat Completions API types, used for both
//! request building and response parsing.

use serde::{Deserialize, Serialize};

// ─── Request Types ───────────────────────────────────────────────────────────

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

/// Per-task sampling overrides. Unset fields fall back to the model config.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SamplingOverrides {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

// ─── Reply Content ───────────────────────────────────────────────────────────

/// Message content as a completion service may return it: a plain string or
/// a list of typed segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyContent {
    Text(String),
    Segments(Vec<Segment>),
}

/// One element of a segmented reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// A bare string element.
    Plain(String),
    /// `{"type": "...", "text": "..."}`. Only `type == "text"` is kept.
    Typed {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        text: Option<String>,
    },
    /// Anything else (images, tool blocks). Ignored when flattening.
    Other(serde_json::Value),
}

impl ReplyContent {
    /// Single display string: text is trimmed; segments keep plain strings
    /// and text-typed parts, joined by newlines, then trimmed.
    pub fn flatten(&self) -> String {
        match self {
            ReplyContent::Text(text) => text.trim().to_string(),
            ReplyContent::Segments(segments) => segments
                .iter()
                .filter_map(|segment| match segment {
                    Segment::Plain(text) => Some(text.as_str()),
                    Segment::Typed {
                        kind,
                        text: Some(text),
                    } if kind == "text" => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string(),
        }
    }
}

impl Default for ReplyContent {
    fn default() -> Self {
        ReplyContent::Text(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_text_trims() {
        let reply = ReplyContent::Text("  hello \n".into());
        assert_eq!(reply.flatten(), "hello");
    }

    #[test]
    fn test_flatten_segments_keeps_text_parts() {
        let reply: ReplyContent = serde_json::from_str(
            r#"[
                {"type": "text", "text": " first "},
                {"type": "image_url", "image_url": {"url": "http://x"}},
                "second",
                {"type": "text"}
            ]"#,
        )
        .unwrap();
        assert_eq!(reply.flatten(), "first \nsecond");
    }

    #[test]
    fn test_flatten_empty_segments() {
        assert_eq!(ReplyContent::Segments(vec![]).flatten(), "");
        assert_eq!(ReplyContent::default().flatten(), "");
    }

    #[test]
    fn test_string_content_deserializes_as_text() {
        let reply: ReplyContent = serde_json::from_str(r#""just text""#).unwrap();
        assert_eq!(reply, ReplyContent::Text("just text".into()));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
