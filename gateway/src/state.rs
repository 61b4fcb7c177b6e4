use anyhow::{Context, Result};
use localgate_agent::ToolRegistry;
use localgate_backend::{LlmBackend, OllamaClient};
use localgate_core::Config;
use std::sync::Arc;

use crate::limiter::RequestLimiter;
use crate::sessions::SessionStore;

pub struct AppState {
    pub config: Config,
    /// Direct daemon access for readiness and model listing
    pub daemon: OllamaClient,
    pub tools: Arc<ToolRegistry>,
    pub sessions: SessionStore,
    pub limiter: RequestLimiter,
}

impl AppState {
    /// State talking to the daemon configured in `config`
    pub fn new(config: Config) -> Result<Self> {
        let daemon = OllamaClient::new(&config.daemon, &config.readiness)
            .context("Failed to build model daemon client")?;
        let backend: Arc<dyn LlmBackend> = Arc::new(daemon.clone());
        Self::with_backend(config, daemon, backend)
    }

    /// State with a custom generation backend
    pub fn with_backend(
        config: Config,
        daemon: OllamaClient,
        backend: Arc<dyn LlmBackend>,
    ) -> Result<Self> {
        let tools = ToolRegistry::from_names(&config.agent.tools, &config.agent.workspace_root)
            .context("Invalid tool configuration")?;
        let tools = Arc::new(tools);

        tracing::info!(
            "Gateway state: daemon {}, model {}, {} tools",
            daemon.base_url(),
            daemon.default_model(),
            tools.len()
        );

        Ok(Self {
            sessions: SessionStore::new(backend, tools.clone(), config.agent.history_limit)
                .with_max_sessions(config.agent.max_sessions),
            limiter: RequestLimiter::from_config(&config.concurrency),
            daemon,
            tools,
            config,
        })
    }
}
