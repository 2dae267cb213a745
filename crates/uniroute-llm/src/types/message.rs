use serde::{Deserialize, Serialize};

/// Role of a message participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
}

/// Message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author
    pub role: Role,
    /// Message content
    pub content: Content,
}

impl Message {
    /// Plain-text user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::Text(text.into()),
        }
    }

    /// Plain-text assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::Text(text.into()),
        }
    }
}

/// Message content, either plain text or multimodal parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Plain text content
    Text(String),
    /// Array of content parts (text, images, audio)
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Extract text content, joining text parts and skipping media
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } | ContentPart::AudioUrl { .. } => None,
                })
                .collect(),
        }
    }

    /// Number of text characters, used for token estimation
    pub fn text_len(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Parts(parts) => parts
                .iter()
                .map(|p| match p {
                    ContentPart::Text { text } => text.chars().count(),
                    ContentPart::ImageUrl { .. } | ContentPart::AudioUrl { .. } => 0,
                })
                .sum(),
        }
    }
}

/// Individual part within a multimodal message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content block
    Text {
        /// The text string
        text: String,
    },
    /// Image for vision models
    ImageUrl {
        /// HTTP URL or base64 data URI
        image_url: MediaUrl,
    },
    /// Audio for voice models
    AudioUrl {
        /// HTTP URL or base64 data URI
        audio_url: MediaUrl,
    },
}

/// Reference to media content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaUrl {
    /// HTTP URL or base64 data URI
    pub url: String,
}
