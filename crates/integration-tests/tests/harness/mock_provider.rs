//! Scriptable in-process provider
//!
//! Counts calls and can be made unhealthy, failing, slow, or streaming
//! with a fixed chunk script.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;
use uniroute_llm::{
    ChatRequest, ChatResponse, ChunkStream, LlmError, Provider, ProviderCapabilities, RequestContext, StreamChunk,
    Usage,
};

/// How a streaming mock behaves
#[derive(Debug, Clone)]
pub enum StreamScript {
    /// Emit these fragments, then end without a terminal chunk
    Chunks(Vec<String>),
    /// Emit these fragments, the last one marked done
    ChunksWithTerminal(Vec<String>),
    /// Emit these fragments, then fail
    FailAfter(Vec<String>),
    /// End immediately without output or error
    Empty,
    /// Never produce anything
    Hang,
}

/// Mock provider backend
pub struct MockProvider {
    name: String,
    models: Vec<String>,
    healthy: AtomicBool,
    failing: AtomicBool,
    response: String,
    usage: Usage,
    delay: Option<Duration>,
    stream: Option<StreamScript>,
    chat_calls: AtomicU32,
    stream_calls: AtomicU32,
    health_checks: AtomicU32,
}

impl MockProvider {
    /// Healthy, non-streaming provider serving `test-model`
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            models: vec!["test-model".to_owned()],
            healthy: AtomicBool::new(true),
            failing: AtomicBool::new(false),
            response: format!("Hello from {name}"),
            usage: Usage::default(),
            delay: None,
            stream: None,
            chat_calls: AtomicU32::new(0),
            stream_calls: AtomicU32::new(0),
            health_checks: AtomicU32::new(0),
        }
    }

    /// Replace the served model list
    pub fn models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| (*m).to_owned()).collect();
        self
    }

    /// Fail both health checks and chat calls
    pub fn unavailable(self) -> Self {
        self.healthy.store(false, Ordering::SeqCst);
        self.failing.store(true, Ordering::SeqCst);
        self
    }

    /// Pass health checks but fail every call
    pub fn failing(self) -> Self {
        self.failing.store(true, Ordering::SeqCst);
        self
    }

    /// Report token usage on responses
    pub fn usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.usage = Usage::new(prompt_tokens, completion_tokens);
        self
    }

    /// Sleep before answering a chat call
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Advertise streaming with the given script
    pub fn streaming(mut self, script: StreamScript) -> Self {
        self.stream = Some(script);
        self
    }

    /// Share the provider
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Flip the health check result
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Number of `chat` calls received
    pub fn chat_calls(&self) -> u32 {
        self.chat_calls.load(Ordering::SeqCst)
    }

    /// Number of `chat_stream` calls received
    pub fn stream_calls(&self) -> u32 {
        self.stream_calls.load(Ordering::SeqCst)
    }

    /// Number of health checks received
    pub fn health_checks(&self) -> u32 {
        self.health_checks.load(Ordering::SeqCst)
    }

    fn unavailable_error(&self) -> LlmError {
        LlmError::Unavailable {
            provider: self.name.clone(),
        }
    }
}

fn fragments(id: &str, parts: &[String]) -> Vec<Result<StreamChunk, LlmError>> {
    parts.iter().map(|p| Ok(StreamChunk::delta(id, p.as_str()))).collect()
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: self.stream.is_some(),
        }
    }

    fn models(&self) -> Vec<String> {
        self.models.clone()
    }

    async fn chat(&self, request: &ChatRequest, _context: &RequestContext) -> Result<ChatResponse, LlmError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(self.unavailable_error());
        }

        Ok(ChatResponse::text(
            format!("{}-response", self.name),
            &request.model,
            &self.response,
            self.usage,
        ))
    }

    async fn health_check(&self, _context: &RequestContext) -> Result<(), LlmError> {
        self.health_checks.fetch_add(1, Ordering::SeqCst);

        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(self.unavailable_error())
        }
    }

    async fn chat_stream(&self, _request: &ChatRequest, _context: &RequestContext) -> Result<ChunkStream, LlmError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);

        let Some(script) = &self.stream else {
            return Err(LlmError::StreamingUnsupported {
                provider: self.name.clone(),
            });
        };

        if self.failing.load(Ordering::SeqCst) {
            return Err(self.unavailable_error());
        }

        let id = format!("{}-stream", self.name);

        let stream: ChunkStream = match script {
            StreamScript::Chunks(parts) => Box::pin(stream::iter(fragments(&id, parts))),
            StreamScript::ChunksWithTerminal(parts) => {
                let mut items = fragments(&id, parts);
                if let Some(Ok(last)) = items.last_mut() {
                    last.done = true;
                    last.usage = Some(self.usage);
                }
                Box::pin(stream::iter(items))
            }
            StreamScript::FailAfter(parts) => {
                let mut items = fragments(&id, parts);
                items.push(Err(LlmError::Streaming(format!("{} connection reset", self.name))));
                Box::pin(stream::iter(items))
            }
            StreamScript::Empty => Box::pin(stream::empty::<Result<StreamChunk, LlmError>>()),
            StreamScript::Hang => Box::pin(stream::pending::<Result<StreamChunk, LlmError>>()),
        };

        Ok(stream)
    }
}
