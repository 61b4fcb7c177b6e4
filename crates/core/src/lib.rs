//! localgate_core - Shared configuration
//!
//! This crate provides:
//! - The TOML-backed gateway configuration and its defaults
//! - `PORT` environment resolution for the HTTP front-end

pub mod config;

pub use config::{
    resolve_port, AgentConfig, ConcurrencyConfig, Config, DaemonConfig, GatewayConfig,
    ReadinessConfig, SupervisorConfig, PORT_ENV,
};
