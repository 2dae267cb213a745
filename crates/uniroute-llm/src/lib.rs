//! Provider-agnostic LLM types for UniRoute
//!
//! Defines the canonical chat request/response/chunk representation, the
//! [`Provider`] capability contract every backend implements, and the
//! per-request [`RequestContext`] carrying caller identity and cancellation.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod context;
pub mod error;
pub mod provider;
pub mod types;

pub use context::{CallerId, RequestContext};
pub use error::LlmError;
pub use provider::{ChunkStream, Provider, ProviderCapabilities};
pub use types::{ChatRequest, ChatResponse, Choice, Content, ContentPart, MediaUrl, Message, Role, StreamChunk, Usage};
