// src/llm/client.rs

use std::env;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::error::OrionError;

use super::{CompletionClient, CompletionRequest};

/// OpenAI-compatible chat-completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenAiClient {
    /// Build from the environment. `OPENAI_API_KEY` is required; base URL
    /// and model come from config defaults unless overridden.
    pub fn from_env(api_base: &str, model: &str) -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
        Ok(Self {
            client: Client::new(),
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn payload(&self, request: &CompletionRequest) -> Value {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(json!({ "role": "system", "content": request.system_prompt }));
        for message in &request.history {
            messages.push(json!({ "role": message.role, "content": message.content }));
        }
        messages.push(json!({ "role": "user", "content": request.user_message }));
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, OrionError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.payload(&request))
            .send()
            .await
            .map_err(|e| OrionError::Collaborator(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(OrionError::Collaborator(format!("API error {}: {}", status, body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| OrionError::Collaborator(e.to_string()))?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OrionError::Collaborator("malformed completion response".into()))
    }
}
