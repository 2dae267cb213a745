//! Shared fixtures for router integration tests

#![allow(dead_code)]

pub mod mock_provider;
pub mod services;

use uniroute_llm::{ChatRequest, Message};

/// Single-message request for `model`
pub fn request(model: &str) -> ChatRequest {
    ChatRequest::new(model, vec![Message::user("Hello")])
}
