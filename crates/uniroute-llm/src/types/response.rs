use serde::{Deserialize, Serialize};

use super::message::Message;

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated in the completion
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion)
    pub total_tokens: u32,
}

impl Usage {
    /// Usage with `total_tokens` derived from the parts
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// A single completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice
    pub index: u32,
    /// Generated message
    pub message: Message,
}

/// Chat completion result
///
/// Providers fill the core fields; the router annotates `provider`,
/// `latency_ms`, and `cost` after a successful attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Unique response identifier
    pub id: String,
    /// Model used for generation
    pub model: String,
    /// Generated choices
    pub choices: Vec<Choice>,
    /// Token usage statistics
    #[serde(default)]
    pub usage: Usage,
    /// Provider that served the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Round-trip latency of the successful attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Cost in USD computed from actual usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl ChatResponse {
    /// Single-choice assistant response
    pub fn text(id: impl Into<String>, model: impl Into<String>, content: impl Into<String>, usage: Usage) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
            }],
            usage,
            provider: None,
            latency_ms: None,
            cost: None,
        }
    }

    /// Text of the first choice
    pub fn content(&self) -> String {
        self.choices
            .first()
            .map(|c| c.message.content.as_text())
            .unwrap_or_default()
    }
}
