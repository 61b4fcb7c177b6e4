//! localgate_backend - Model daemon client
//!
//! This crate defines the contract between the gateway and the local
//! inference daemon, plus the Ollama-compatible HTTP implementation:
//! - `LlmBackend`: text generation over a message history
//! - `OllamaClient`: chat requests, model listing, readiness probing
//! - `ReadinessPolicy`: bounded exponential-backoff polling

pub mod ollama;
pub mod readiness;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaClient;
pub use readiness::{poll_until_ready, ProbeOutcome, ReadinessPolicy};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message exchanged with the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Failures talking to the daemon
#[derive(Debug, Error)]
pub enum BackendError {
    /// No connection could be made (refused, DNS, connect timeout)
    #[error("model daemon unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// The daemon answered but is not able to serve yet
    #[error("model daemon at {url} is not ready: {reason}")]
    NotReady { url: String, reason: String },

    #[error("model daemon request timed out after {0:?}")]
    Timeout(Duration),

    #[error("model daemon returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response from model daemon: {0}")]
    InvalidResponse(String),

    #[error("http error: {0}")]
    Http(String),
}

/// Anything that can turn a prompt plus history into a reply
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a reply to `prompt`.
    ///
    /// The message list sent to the model is the optional system prompt,
    /// then `history`, then `prompt` as a user message. `model` overrides the
    /// backend's default model.
    async fn generate(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        system_prompt: Option<&str>,
        model: Option<&str>,
    ) -> Result<String, BackendError>;
}

/// Assemble the message list for a generation call
pub fn build_messages(
    prompt: &str,
    history: &[ChatMessage],
    system_prompt: Option<&str>,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
        messages.push(ChatMessage::system(system));
    }
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(prompt));
    messages
}
