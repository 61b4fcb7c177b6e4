use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use localgate_agent::ChatOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::sessions::DEFAULT_SESSION;
use crate::state::AppState;

const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User's message to send to the agent
    pub message: String,
    /// Whether to allow tool invocations
    #[serde(default)]
    pub use_tools: bool,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Model override for this message
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

impl ChatRequest {
    /// Check the payload and return the session it targets
    pub fn validate(&self, max_message_chars: usize) -> Result<String, GatewayError> {
        if self.message.trim().is_empty() {
            return Err(GatewayError::Validation("message must not be empty".to_string()));
        }

        let chars = self.message.chars().count();
        if chars > max_message_chars {
            return Err(GatewayError::PayloadTooLarge(format!(
                "message is {} characters, limit is {}",
                chars, max_message_chars
            )));
        }

        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(GatewayError::Validation("model must not be empty".to_string()));
            }
        }

        match self.session_id.as_deref() {
            None => Ok(DEFAULT_SESSION.to_string()),
            Some(id) if is_valid_session_id(id) => Ok(id.to_string()),
            Some(_) => Err(GatewayError::Validation(format!(
                "session_id must be 1-{} characters of [A-Za-z0-9_.-]",
                MAX_SESSION_ID_LEN
            ))),
        }
    }
}

fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Chat with the agent. Optionally allow tool use.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::Validation(e.body_text()))?;
    let session_id = request.validate(state.config.gateway.max_message_chars)?;

    let options = ChatOptions {
        use_tools: request.use_tools,
        model: request.model,
    };

    // Lock order: daemon slot, then session. Every request, including those
    // sharing a session, is subject to the queue bound and timeout.
    let _permit = state.limiter.acquire().await?;
    let agent = state.sessions.get_or_create(&session_id).await;
    let mut agent = agent.lock().await;

    let reply = agent.chat(&request.message, &options).await?;

    Ok(Json(ChatResponse {
        response: reply,
        session_id,
    }))
}
