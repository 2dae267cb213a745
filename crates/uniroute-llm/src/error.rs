use thiserror::Error;

/// Errors raised by a provider backend
#[derive(Debug, Error)]
pub enum LlmError {
    /// Upstream provider returned an error
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Provider is not reachable or refused the request
    #[error("provider unavailable: {provider}")]
    Unavailable { provider: String },

    /// Provider has no streaming capability
    #[error("provider does not support streaming: {provider}")]
    StreamingUnsupported { provider: String },

    /// Error during a streaming response
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Request was rejected as malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request context was cancelled
    #[error("request cancelled")]
    Cancelled,

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
