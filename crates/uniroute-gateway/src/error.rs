//! Router-level error types

use thiserror::Error;
use uniroute_llm::LlmError;
use uniroute_routing::RoutingError;

/// Errors surfaced by [`crate::Router`]
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No provider was ever registered; a configuration problem, never retried
    #[error("no providers registered")]
    NoProvidersRegistered,

    /// The strategy could not pick a provider
    #[error("failed to select provider: {0}")]
    Selection(#[from] RoutingError),

    /// Every candidate failed; carries the last failure
    #[error("all providers failed after {attempts} attempt(s), last error: {source}")]
    AllProvidersFailed {
        /// Number of candidates tried
        attempts: usize,
        /// Error from the final candidate
        #[source]
        source: LlmError,
    },

    /// A stream failed after output had already reached the caller
    #[error("stream from {provider} failed mid-response: {source}")]
    StreamInterrupted {
        /// Provider whose stream failed
        provider: String,
        /// Underlying stream error
        #[source]
        source: LlmError,
    },

    /// Lookup of an unregistered provider name
    #[error("provider not found: {provider}")]
    ProviderNotFound {
        /// Requested name
        provider: String,
    },

    /// A stream ended without producing a chunk or an error
    #[error("stream ended without producing any output")]
    EmptyStream,

    /// The request context was cancelled
    #[error("request cancelled")]
    Cancelled,
}
