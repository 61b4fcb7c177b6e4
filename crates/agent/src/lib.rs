//! localgate_agent - Conversational agent with local tools
//!
//! The agent keeps a conversation history, forwards messages to an
//! `LlmBackend`, and optionally lets the model call the tools in its
//! `ToolRegistry` (file reading, file search, note logging).

pub mod agent;
pub mod tools;

pub use agent::{Agent, AgentError, ChatOptions};
pub use tools::{Tool, ToolError, ToolInfo, ToolRegistry};
