//! OpenAI chat completions client.
//!
//! Also works with OpenAI-compatible servers via `OPENAI_BASE_URL`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::env;

use super::{Conversation, ModelClient};
use crate::error::{TransportError, TransportResult};
use crate::logs::{log_info_indent, log_warning_indent};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Good cost/latency for CSV emission
const DEFAULT_MODEL: &str = "gpt-4o-mini";

const DEFAULT_MAX_TOKENS: u32 = 1500;

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiClient {
    /// Create a new client with explicit API key
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            http: reqwest::Client::new(),
        }
    }

    /// Create a client from OPENAI_API_KEY (and OPENAI_BASE_URL if set)
    pub fn from_env() -> TransportResult<Self> {
        let _ = dotenvy::dotenv();

        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| TransportError::MissingApiKey("OPENAI_API_KEY not set".to_string()))?;

        let client = Self::new(api_key);
        Ok(match env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => client.with_base_url(&url),
            _ => client,
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(&self, conversation: &Conversation) -> Value {
        serde_json::json!({
            "model": self.model,
            "messages": conversation.messages(),
            "temperature": 0,
            "top_p": 1,
            "max_tokens": self.max_tokens,
        })
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn send(&self, conversation: &Conversation) -> TransportResult<String> {
        log_info_indent(format!("📡 {} ({} messages)", self.name(), conversation.messages().len()), 1);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
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
            let message = parse_error_message(&body);
            log_warning_indent(format!("HTTP {}: {}", status, message), 1);
            return Err(TransportError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let text = parse_completion(&body)?;
        log_info_indent(format!("Received {} bytes", text.len()), 1);
        Ok(text)
    }

    fn name(&self) -> String {
        format!("openai/{}", self.model)
    }
}

/// Text of the first choice; missing or null content reads as "".
///
/// An empty reply is the validator's call, not a transport failure.
fn parse_completion(body: &str) -> TransportResult<String> {
    let completion: ChatCompletion =
        serde_json::from_str(body).map_err(|e| TransportError::InvalidJson(e.to_string()))?;

    Ok(completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}

fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<OpenAiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(500).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_carries_history() {
        let client = OpenAiClient::new("sk-test".into()).with_model("gpt-test");
        let mut conversation = Conversation::new("system text");
        conversation.push_user("list countries");

        let body = client.request_body(&conversation);
        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["temperature"], 0);
        assert_eq!(body["max_tokens"], 1500);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "list countries");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OpenAiClient::new("k".into()).with_base_url("http://localhost:8000/v1/");
        assert_eq!(client.endpoint(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"```csv\ncountry,capital\n```"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "```csv\ncountry,capital\n```");
    }

    #[test]
    fn test_parse_completion_null_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "");
        assert_eq!(parse_completion(r#"{"choices":[]}"#).unwrap(), "");
    }

    #[test]
    fn test_parse_completion_invalid_json() {
        assert!(matches!(parse_completion("<html>"), Err(TransportError::InvalidJson(_))));
    }

    #[test]
    fn test_parse_error_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(parse_error_message(body), "Incorrect API key provided");
        assert_eq!(parse_error_message("Bad Gateway"), "Bad Gateway");
    }
}
