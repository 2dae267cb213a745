//! Capability contract implemented by every LLM backend

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::context::RequestContext;
use crate::error::LlmError;
use crate::types::{ChatRequest, ChatResponse, StreamChunk};

/// Incremental chunks produced by a streaming provider call
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, LlmError>> + Send>>;

/// Capabilities advertised by a provider
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderCapabilities {
    /// Whether the provider implements [`Provider::chat_stream`]
    pub streaming: bool,
}

/// Trait implemented by each LLM provider backend
///
/// Providers are shared as `Arc<dyn Provider>` between the registry, the
/// routing strategies, and in-flight requests.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique provider name, the registry key
    fn name(&self) -> &str;

    /// Advertised capabilities
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::default()
    }

    /// Models this provider can serve
    fn models(&self) -> Vec<String>;

    /// Send a non-streaming chat request
    async fn chat(&self, request: &ChatRequest, context: &RequestContext) -> Result<ChatResponse, LlmError>;

    /// Check whether the provider is currently usable
    async fn health_check(&self, context: &RequestContext) -> Result<(), LlmError>;

    /// Send a streaming chat request
    async fn chat_stream(&self, request: &ChatRequest, context: &RequestContext) -> Result<ChunkStream, LlmError> {
        let _ = (request, context);
        Err(LlmError::StreamingUnsupported {
            provider: self.name().to_owned(),
        })
    }

    /// Whether `model` appears in [`Provider::models`], compared exactly
    fn serves(&self, model: &str) -> bool {
        self.models().iter().any(|m| m == model)
    }
}
