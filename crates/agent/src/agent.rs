use localgate_backend::{BackendError, ChatMessage, LlmBackend};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::tools::{ToolError, ToolRegistry};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Per-message options
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Let the model request tool invocations
    pub use_tools: bool,
    /// Override the backend's default model
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToolCallEnvelope {
    #[serde(default)]
    tool: Option<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    args: Value,
}

/// Conversation with a model, optionally able to call tools.
///
/// In tool mode the model is told about the registered tools and may answer
/// with `{"tool": {"name": ..., "args": {...}}}`. Such a reply is executed and
/// the tool's JSON result becomes the agent's reply. Anything else, including
/// malformed or failing tool calls, is returned as a normal reply.
pub struct Agent {
    backend: Arc<dyn LlmBackend>,
    tools: Arc<ToolRegistry>,
    history: Vec<ChatMessage>,
    history_limit: usize,
}

impl Agent {
    pub fn new(backend: Arc<dyn LlmBackend>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            backend,
            tools,
            history: Vec::new(),
            history_limit: 0,
        }
    }

    /// Keep at most `limit` messages of history (0 keeps everything)
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// System prompt describing the available tools and the call format
    pub fn system_prompt(&self) -> String {
        let mut lines = vec![
            "You are a local AI agent. The user may ask you to perform tasks.".to_string(),
            "You have access to the following tools:".to_string(),
        ];
        for tool in self.tools.iter() {
            lines.push(format!(
                "- {}: {}. Input schema: {}",
                tool.name(),
                tool.description(),
                tool.input_schema()
            ));
        }
        lines.push(
            "When you decide to use a tool, respond with a JSON object in the following format:"
                .to_string(),
        );
        lines.push(r#"{"tool": {"name": "<tool_name>", "args": {"param1": "value", ...}}}"#.to_string());
        lines.push("Do not wrap the JSON in code fences or include any additional text.".to_string());
        lines.join("\n")
    }

    /// Handle one user message and return the agent's reply
    pub async fn chat(&mut self, message: &str, options: &ChatOptions) -> Result<String, AgentError> {
        tracing::info!(
            "User message ({} chars, tools: {})",
            message.chars().count(),
            options.use_tools
        );

        let system_prompt = options.use_tools.then(|| self.system_prompt());
        let response = self
            .backend
            .generate(
                message,
                &self.history,
                system_prompt.as_deref(),
                options.model.as_deref(),
            )
            .await?;
        let reply = response.trim().to_string();

        if options.use_tools && reply.starts_with('{') {
            match self.run_tool_call(&reply).await {
                Ok(Some(result)) => {
                    self.remember(ChatMessage::user(message));
                    self.remember(ChatMessage::assistant(reply));
                    self.remember(ChatMessage::assistant(result.clone()));
                    return Ok(result);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Tool call failed, returning raw reply: {}", e),
            }
        }

        self.remember(ChatMessage::user(message));
        self.remember(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    /// Execute `reply` as a tool call. `Ok(None)` means it was JSON but not a call.
    async fn run_tool_call(&self, reply: &str) -> Result<Option<String>, ToolError> {
        let envelope: ToolCallEnvelope = serde_json::from_str(reply)
            .map_err(|e| ToolError::InvalidArguments(format!("unparseable tool call: {}", e)))?;
        let Some(call) = envelope.tool else {
            return Ok(None);
        };

        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        let args = if call.args.is_null() {
            Value::Object(Default::default())
        } else {
            call.args
        };

        tracing::info!("Invoking tool {} with args {}", call.name, args);
        let result = tool.run(args).await?;
        serde_json::to_string(&result)
            .map(Some)
            .map_err(|e| ToolError::Failed(e.to_string()))
    }

    fn remember(&mut self, message: ChatMessage) {
        self.history.push(message);
        if self.history_limit > 0 && self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
        }
    }
}
