//! Canonical request/response representation shared by every provider

pub mod message;
pub mod request;
pub mod response;
pub mod stream;

pub use message::{Content, ContentPart, MediaUrl, Message, Role};
pub use request::ChatRequest;
pub use response::{ChatResponse, Choice, Usage};
pub use stream::StreamChunk;
