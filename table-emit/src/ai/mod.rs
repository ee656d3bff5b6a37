//! Model request collaborators.
//!
//! [`ModelClient`] is the seam between the orchestrator and a language model
//! provider. Two HTTP implementations ship with the crate:
//!
//! - [`OpenAiClient`] - chat completions (`OPENAI_API_KEY`)
//! - [`AnthropicClient`] - messages API (`ANTHROPIC_API_KEY`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use table_emit::ai::{client_from_env, Conversation, Provider};
//!
//! let client = client_from_env(Provider::OpenAi, None, None)?;
//! let mut conversation = Conversation::new(table_emit::ai::system_prompt());
//! conversation.push_user(table_emit::ai::DEFAULT_USER_PROMPT);
//! let reply = client.send(&conversation).await?;
//! ```

pub mod anthropic;
pub mod openai;
pub mod prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportResult;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;
pub use prompt::{correction_prompt, system_prompt, DEFAULT_USER_PROMPT};

/// A chat message for completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Message history for one run: system prompt first, then alternating turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system: impl Into<String>) -> Self {
        Self { messages: vec![ChatMessage::system(system)] }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Content of the system message.
    pub fn system_prompt(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// Everything except the system message.
    pub fn turns(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.role != "system")
    }

    /// The prompt the next request answers.
    pub fn last_user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
    }
}

/// Anything that can turn a conversation into a raw reply.
///
/// Implementations report network and provider failures as
/// [`crate::error::TransportError`]; they never retry on their own.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the conversation, return the model's reply text.
    async fn send(&self, conversation: &Conversation) -> TransportResult<String>;

    /// Provider and model, for logs.
    fn name(&self) -> String;
}

/// Supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    #[value(name = "openai")]
    OpenAi,
    Anthropic,
}

/// Build a client for `provider` from environment credentials.
///
/// `model` and `max_tokens` override the provider defaults when given.
pub fn client_from_env(
    provider: Provider,
    model: Option<&str>,
    max_tokens: Option<u32>,
) -> TransportResult<Box<dyn ModelClient>> {
    Ok(match provider {
        Provider::OpenAi => {
            let mut client = OpenAiClient::from_env()?;
            if let Some(m) = model {
                client = client.with_model(m);
            }
            if let Some(n) = max_tokens {
                client = client.with_max_tokens(n);
            }
            Box::new(client)
        }
        Provider::Anthropic => {
            let mut client = AnthropicClient::from_env()?;
            if let Some(m) = model {
                client = client.with_model(m);
            }
            if let Some(n) = max_tokens {
                client = client.with_max_tokens(n);
            }
            Box::new(client)
        }
    })
}
