use anyhow::Result;
use localgate_backend::ReadinessPolicy;
use localgate_core::Config;
use localgate_gateway::AppState;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::commands::daemon::exit_with;
use crate::commands::serve::{bind_addr, print_endpoints};
use crate::daemon::{shutdown_signal, DaemonExit, Supervisor};

pub async fn execute(config: Config, port: Option<u16>) -> Result<()> {
    let addr = bind_addr(&config, port)?;
    let state = Arc::new(AppState::new(config)?);
    let policy = ReadinessPolicy::from(&state.config.readiness);

    println!("Starting model daemon...");
    let mut supervisor = Supervisor::spawn(&state.config.supervisor)?;
    if let Err(e) = supervisor.wait_ready(&state.daemon, &policy).await {
        supervisor.terminate().await?;
        return Err(e);
    }

    println!("Starting localgate gateway...");
    print_endpoints(&addr);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(localgate_gateway::run_server(addr, state, async move {
        let _ = stop_rx.await;
    }));

    tokio::select! {
        result = &mut server => {
            // Gateway ended on its own (e.g. bind failure); take the daemon down too
            supervisor.terminate().await?;
            result??;
            Ok(())
        }
        exit = supervisor.run_until(shutdown_signal()) => {
            let _ = stop_tx.send(());
            server.await??;
            match exit? {
                DaemonExit::Stopped(_) => {
                    println!("Stopped.");
                    Ok(())
                }
                DaemonExit::Exited(status) => exit_with(status),
            }
        }
    }
}
