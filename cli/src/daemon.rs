//! Model daemon process supervision

use anyhow::{Context, Result};
use localgate_backend::{OllamaClient, ReadinessPolicy};
use localgate_core::SupervisorConfig;
use std::future::Future;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};

/// How a supervised daemon ended
#[derive(Debug)]
pub enum DaemonExit {
    /// The child exited on its own
    Exited(ExitStatus),
    /// The child was stopped after a shutdown request
    Stopped(ExitStatus),
}

/// A daemon process owned by this CLI.
///
/// The child is killed if the supervisor is dropped without a clean stop.
pub struct Supervisor {
    child: Child,
    name: String,
    grace: Duration,
}

impl Supervisor {
    /// Launch the configured daemon command
    pub fn spawn(config: &SupervisorConfig) -> Result<Self> {
        let child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start `{}`", config.command))?;

        tracing::info!(
            "Started {} {} (PID: {})",
            config.command,
            config.args.join(" "),
            child.id().map(|p| p.to_string()).unwrap_or_else(|| "?".to_string())
        );

        Ok(Self {
            child,
            name: config.command.clone(),
            grace: config.shutdown_grace(),
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the daemon to answer its readiness probe.
    ///
    /// Fails if the child exits first or the probe gives up.
    pub async fn wait_ready(&mut self, client: &OllamaClient, policy: &ReadinessPolicy) -> Result<()> {
        tokio::select! {
            ready = client.wait_until_ready(policy) => {
                ready.with_context(|| format!("{} did not become ready", self.name))
            }
            status = self.child.wait() => {
                let status = status?;
                anyhow::bail!("{} exited before becoming ready ({})", self.name, status)
            }
        }
    }

    /// Wait for the child to exit, or stop it when `shutdown` resolves
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<DaemonExit>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            status = self.child.wait() => {
                let status = status?;
                tracing::warn!("{} exited ({})", self.name, status);
                Ok(DaemonExit::Exited(status))
            }
            _ = shutdown => {
                tracing::info!("Shutdown requested, stopping {}", self.name);
                self.terminate().await.map(DaemonExit::Stopped)
            }
        }
    }

    /// Stop the child: SIGTERM, then SIGKILL after the grace period
    pub async fn terminate(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.child.try_wait()? {
            return Ok(status);
        }

        if self.signal_terminate() {
            if let Ok(status) = tokio::time::timeout(self.grace, self.child.wait()).await {
                let status = status?;
                tracing::info!("{} stopped ({})", self.name, status);
                return Ok(status);
            }
            tracing::warn!("{} ignored SIGTERM for {:?}, killing", self.name, self.grace);
        }

        self.child.kill().await?;
        let status = self.child.wait().await?;
        tracing::info!("{} killed ({})", self.name, status);
        Ok(status)
    }

    #[cfg(unix)]
    fn signal_terminate(&self) -> bool {
        match self.child.id() {
            // SAFETY: kill(2) with a PID we spawned and have not yet reaped
            Some(pid) => unsafe { libc::kill(pid as i32, libc::SIGTERM) == 0 },
            None => false,
        }
    }

    #[cfg(not(unix))]
    fn signal_terminate(&self) -> bool {
        false
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use localgate_core::{DaemonConfig, ReadinessConfig};
    use std::time::Instant;

    fn shell(script: &str) -> SupervisorConfig {
        SupervisorConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            shutdown_grace_secs: 1,
        }
    }

    fn closed_client() -> OllamaClient {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let daemon = DaemonConfig {
            url: format!("http://127.0.0.1:{}", port),
            ..DaemonConfig::default()
        };
        OllamaClient::new(&daemon, &ReadinessConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn does_not_return_while_child_is_alive() {
        let mut supervisor = Supervisor::spawn(&shell("sleep 0.3")).unwrap();
        let started = Instant::now();

        let exit = supervisor
            .run_until(std::future::pending::<()>())
            .await
            .unwrap();

        assert!(matches!(exit, DaemonExit::Exited(status) if status.success()));
        assert!(started.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn child_exit_code_is_reported() {
        let mut supervisor = Supervisor::spawn(&shell("exit 3")).unwrap();
        let exit = supervisor
            .run_until(std::future::pending::<()>())
            .await
            .unwrap();
        assert!(matches!(exit, DaemonExit::Exited(status) if status.code() == Some(3)));
    }

    #[tokio::test]
    async fn shutdown_terminates_child() {
        let mut supervisor = Supervisor::spawn(&shell("sleep 30")).unwrap();
        let started = Instant::now();

        let exit = supervisor
            .run_until(tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();

        assert!(matches!(exit, DaemonExit::Stopped(status) if !status.success()));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn stubborn_child_is_killed_after_grace() {
        let mut supervisor =
            Supervisor::spawn(&shell("trap '' TERM; while true; do sleep 0.05; done")).unwrap();
        // let the shell install its trap
        tokio::time::sleep(Duration::from_millis(100)).await;

        let status = supervisor.terminate().await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn early_exit_fails_readiness() {
        let mut supervisor = Supervisor::spawn(&shell("exit 1")).unwrap();
        let policy = ReadinessPolicy {
            max_attempts: 50,
            initial_backoff: Duration::from_millis(20),
            max_backoff: Duration::from_millis(20),
        };

        let err = supervisor
            .wait_ready(&closed_client(), &policy)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exited before becoming ready"));
    }

    #[tokio::test]
    async fn missing_command_fails_to_spawn() {
        let config = SupervisorConfig {
            command: "definitely-not-a-real-daemon".to_string(),
            args: vec![],
            shutdown_grace_secs: 1,
        };
        assert!(Supervisor::spawn(&config).is_err());
    }
}
