use anyhow::Result;
use localgate_backend::{OllamaClient, ReadinessPolicy};
use localgate_core::Config;

use crate::daemon::{shutdown_signal, DaemonExit, Supervisor};

pub async fn execute(config: &Config) -> Result<()> {
    let client = OllamaClient::new(&config.daemon, &config.readiness)?;
    let policy = ReadinessPolicy::from(&config.readiness);

    println!("Starting model daemon: {} {}", config.supervisor.command, config.supervisor.args.join(" "));

    let mut supervisor = Supervisor::spawn(&config.supervisor)?;
    if let Err(e) = supervisor.wait_ready(&client, &policy).await {
        supervisor.terminate().await?;
        return Err(e);
    }

    println!("Model daemon ready at {} (PID: {:?})", client.base_url(), supervisor.id());
    println!("Press Ctrl+C to stop.\n");

    match supervisor.run_until(shutdown_signal()).await? {
        DaemonExit::Stopped(_) => {
            println!("Model daemon stopped.");
            Ok(())
        }
        DaemonExit::Exited(status) => exit_with(status),
    }
}

/// Mirror the daemon's exit status when it ended on its own
pub fn exit_with(status: std::process::ExitStatus) -> Result<()> {
    match status.code() {
        Some(0) => Ok(()),
        Some(code) => {
            eprintln!("Model daemon exited with status {}", code);
            std::process::exit(code);
        }
        None => anyhow::bail!("Model daemon terminated by signal ({})", status),
    }
}
