use anyhow::{Context, Result};
use localgate_backend::ReadinessPolicy;
use localgate_core::Config;
use localgate_gateway::AppState;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::daemon::shutdown_signal;

pub fn bind_addr(config: &Config, port: Option<u16>) -> Result<SocketAddr> {
    let port = config.gateway_port(port)?;
    format!("{}:{}", config.gateway.host, port)
        .parse()
        .with_context(|| format!("Invalid gateway address {}:{}", config.gateway.host, port))
}

pub fn print_endpoints(addr: &SocketAddr) {
    println!("Listening on http://{}", addr);
    println!("\nAPI endpoints:");
    println!("  GET    /               - Welcome message");
    println!("  GET    /health         - Gateway health check");
    println!("  GET    /ready          - Model daemon readiness");
    println!("  POST   /chat           - Chat with the agent");
    println!("  GET    /tools          - List agent tools");
    println!("  GET    /models         - List daemon models");
    println!("  DELETE /sessions/:id   - Clear a session");
    println!("\nPress Ctrl+C to stop.\n");
}

pub async fn execute(config: Config, port: Option<u16>, skip_readiness: bool) -> Result<()> {
    let addr = bind_addr(&config, port)?;
    let state = Arc::new(AppState::new(config)?);

    if skip_readiness {
        tracing::warn!("Skipping readiness check for {}", state.daemon.base_url());
    } else {
        let policy = ReadinessPolicy::from(&state.config.readiness);
        state
            .daemon
            .wait_until_ready(&policy)
            .await
            .context("Model daemon is not available; start it with `localgate daemon`")?;
    }

    println!("Starting localgate gateway...");
    print_endpoints(&addr);

    localgate_gateway::run_server(addr, state, shutdown_signal()).await?;

    Ok(())
}
