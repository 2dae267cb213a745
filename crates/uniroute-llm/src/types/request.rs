use serde::{Deserialize, Serialize};

use super::message::Message;

/// Chat completion request, immutable while it is being routed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Target model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<Message>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Request for `model` with the given conversation
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Total text characters across all messages
    pub fn text_len(&self) -> usize {
        self.messages.iter().map(|m| m.content.text_len()).sum()
    }

    /// Whether the model looks like a tag-qualified local engine model (`llama2:7b`)
    pub fn is_local_model(&self) -> bool {
        self.model.contains(':')
    }
}
