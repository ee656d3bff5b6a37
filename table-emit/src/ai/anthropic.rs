//! Anthropic messages API client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::env;

use super::{Conversation, ModelClient};
use crate::error::{TransportError, TransportResult};
use crate::logs::{log_info_indent, log_warning_indent};

const API_URL: &str = "https://api.anthropic.com/v1/messages";

const API_VERSION: &str = "2023-06-01";

/// Anthropic API client
#[derive(Clone)]
pub struct AnthropicClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    http: reqwest::Client,
}

/// Anthropic API response structure
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

/// Anthropic API error response
#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl AnthropicClient {
    /// Create a new client with explicit API key
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1500,
            http: reqwest::Client::new(),
        }
    }

    /// Create a client from environment variable ANTHROPIC_API_KEY
    pub fn from_env() -> TransportResult<Self> {
        let _ = dotenvy::dotenv();

        let api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| TransportError::MissingApiKey("ANTHROPIC_API_KEY not set".to_string()))?;

        Ok(Self::new(api_key))
    }

    /// Set the model to use
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// System prompt travels outside the message list.
    fn request_body(&self, conversation: &Conversation) -> Value {
        let messages: Vec<&super::ChatMessage> = conversation.turns().collect();
        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": 0,
            "system": conversation.system_prompt(),
            "messages": messages,
        })
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn send(&self, conversation: &Conversation) -> TransportResult<String> {
        log_info_indent(format!("📡 {} ({} messages)", self.name(), conversation.messages().len()), 1);

        let response = self
            .http
            .post(API_URL)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(conversation))
            .send()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.chars().take(500).collect());
            log_warning_indent(format!("HTTP {}: {}", status, message), 1);
            return Err(TransportError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let text = extract_text(&body)?;
        log_info_indent(format!("Received {} bytes", text.len()), 1);
        Ok(text)
    }

    fn name(&self) -> String {
        format!("anthropic/{}", self.model)
    }
}

/// Concatenate the text blocks of a response body (possibly "").
fn extract_text(body: &str) -> TransportResult<String> {
    let response: AnthropicResponse =
        serde_json::from_str(body).map_err(|e| TransportError::InvalidJson(e.to_string()))?;

    Ok(response
        .content
        .iter()
        .filter(|c| c.content_type == "text")
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(""))
}
