//! localgate_gateway - HTTP gateway in front of a local model daemon
//!
//! This crate provides the front-end server that:
//! - Exposes chat, tool listing and model listing endpoints
//! - Keeps per-session conversation history
//! - Bounds and queues concurrent calls into the daemon

pub mod api;
pub mod error;
pub mod limiter;
pub mod server;
pub mod sessions;
pub mod state;

pub use error::GatewayError;
pub use server::{app, run_server};
pub use state::AppState;
