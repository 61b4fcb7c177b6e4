use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable consulted for the gateway port.
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gateway (HTTP front-end) settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Model daemon connection settings
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Readiness probe settings
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Concurrency limits for daemon calls
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,

    /// Agent and tool settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Supervised daemon process
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to listen on (overridden by `PORT`)
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Directory served under `/web`
    #[serde(default)]
    pub web_dir: Option<PathBuf>,

    /// Longest accepted chat message, in characters
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Base URL of the model daemon
    #[serde(default = "default_daemon_url")]
    pub url: String,

    /// Model used when a request does not name one
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Path probed for readiness
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Timeout for a single probe request
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Daemon calls allowed in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Callers allowed to wait for a slot; beyond this requests are rejected
    #[serde(default = "default_max_queue")]
    pub max_queue: usize,

    #[serde(default = "default_queue_timeout_secs")]
    pub queue_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Directory the file tools operate in
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,

    /// Enabled tools, by name
    #[serde(default = "default_tools")]
    pub tools: Vec<String>,

    /// Messages kept per session (0 keeps everything)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Sessions kept by the gateway; the least recently used is evicted
    /// beyond this (0 keeps everything)
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Daemon executable
    #[serde(default = "default_supervisor_command")]
    pub command: String,

    #[serde(default = "default_supervisor_args")]
    pub args: Vec<String>,

    /// Time between SIGTERM and SIGKILL on shutdown
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_gateway_host() -> String {
    "0.0.0.0".to_string()
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_max_message_chars() -> usize {
    32_000
}

fn default_daemon_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen2.5-coder:14b".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_health_path() -> String {
    "/api/version".to_string()
}

fn default_max_attempts() -> u32 {
    8
}

fn default_initial_backoff_ms() -> u64 {
    250
}

fn default_max_backoff_ms() -> u64 {
    4_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

fn default_max_concurrent() -> usize {
    1
}

fn default_max_queue() -> usize {
    32
}

fn default_queue_timeout_secs() -> u64 {
    300
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_tools() -> Vec<String> {
    vec![
        "file_search".to_string(),
        "file_reader".to_string(),
        "logger".to_string(),
    ]
}

fn default_history_limit() -> usize {
    64
}

fn default_max_sessions() -> usize {
    256
}

fn default_supervisor_command() -> String {
    "ollama".to_string()
}

fn default_supervisor_args() -> Vec<String> {
    vec!["serve".to_string()]
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            web_dir: None,
            max_message_chars: default_max_message_chars(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            url: default_daemon_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            health_path: default_health_path(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_queue: default_max_queue(),
            queue_timeout_secs: default_queue_timeout_secs(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            tools: default_tools(),
            history_limit: default_history_limit(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            command: default_supervisor_command(),
            args: default_supervisor_args(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl DaemonConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl ReadinessConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl ConcurrencyConfig {
    pub fn queue_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_timeout_secs)
    }
}

impl SupervisorConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Config {
    /// Get the base directory: ~/.config/localgate/
    pub fn base_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(dir.join("localgate"))
    }

    /// Get the config file path: ~/.config/localgate/config.toml
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.toml"))
    }

    /// Load config from default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`, falling back to defaults when the file is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Save config to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the gateway port from the environment
    pub fn gateway_port(&self, flag: Option<u16>) -> Result<u16> {
        resolve_port(flag, std::env::var(PORT_ENV).ok().as_deref(), self.gateway.port)
    }
}

/// Pick the gateway port: explicit flag, then `PORT`, then the config value.
///
/// A `PORT` that is set but not a valid port number is an error rather than
/// being ignored.
pub fn resolve_port(flag: Option<u16>, env_value: Option<&str>, configured: u16) -> Result<u16> {
    if let Some(port) = flag {
        return Ok(port);
    }

    match env_value {
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .with_context(|| format!("{} must be a port number, got {:?}", PORT_ENV, raw)),
        None => Ok(configured),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_daemon() {
        let config = Config::default();
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.gateway.host, "0.0.0.0");
        assert_eq!(config.daemon.url, "http://localhost:11434");
        assert_eq!(config.daemon.model, "qwen2.5-coder:14b");
        assert_eq!(config.concurrency.max_concurrent, 1);
        assert_eq!(config.agent.tools.len(), 3);
        assert_eq!(config.agent.max_sessions, 256);
    }

    #[test]
    fn port_unset_falls_back_to_config() {
        assert_eq!(resolve_port(None, None, 8000).unwrap(), 8000);
    }

    #[test]
    fn port_env_is_honored_exactly() {
        assert_eq!(resolve_port(None, Some("9123"), 8000).unwrap(), 9123);
    }

    #[test]
    fn port_flag_wins_over_env() {
        assert_eq!(resolve_port(Some(7000), Some("9123"), 8000).unwrap(), 7000);
    }

    #[test]
    fn invalid_port_env_is_an_error() {
        assert!(resolve_port(None, Some("eighty"), 8000).is_err());
        assert!(resolve_port(None, Some("70000"), 8000).is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[daemon]\nmodel = \"llama3\"\n\n[concurrency]\nmax_queue = 2\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.daemon.model, "llama3");
        assert_eq!(config.daemon.url, "http://localhost:11434");
        assert_eq!(config.concurrency.max_queue, 2);
        assert_eq!(config.concurrency.max_concurrent, 1);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.gateway.port = 8123;
        config.agent.tools = vec!["logger".to_string()];
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.gateway.port, 8123);
        assert_eq!(loaded.agent.tools, vec!["logger".to_string()]);
    }
}
