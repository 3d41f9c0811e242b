//! Provider abstraction over chat-completion backends.

use async_trait::async_trait;

use super::error::LLMError;
use super::types::{ChatRequest, ChatResponse};

/// A chat-completion backend.
///
/// The conversation driver only needs a single blocking round-trip; tests
/// substitute a scripted implementation.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LLMError>;
}
