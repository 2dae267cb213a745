use serde::{Deserialize, Serialize};

use super::response::Usage;

/// Incremental unit of a streaming response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Response identifier shared by all chunks of one stream
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Incremental text
    pub content: String,
    /// Set on the terminal chunk
    pub done: bool,
    /// Final usage, present only on the terminal chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Provider that produced the chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl StreamChunk {
    /// Content fragment
    pub fn delta(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Empty terminal chunk
    pub fn terminal(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            done: true,
            ..Self::default()
        }
    }
}
