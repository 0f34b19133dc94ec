// src/llm/mod.rs
// Completion collaborator: the contract the session controller suspends on,
// plus the OpenAI-compatible client used by the binary.

pub mod client;

pub use client::OpenAiClient;

use async_trait::async_trait;

use crate::error::OrionError;

/// One message of serialized history sent to the completion API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Everything a completion call needs; assembled fresh per turn.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub history: Vec<ChatMessage>,
    pub user_message: String,
    pub temperature: f32,
}

/// The completion collaborator. May fail with transport or rate-limit
/// errors; cancellation happens by dropping the in-flight future.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, OrionError>;
}
