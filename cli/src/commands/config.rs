use anyhow::Result;
use localgate_core::Config;
use std::path::Path;

pub fn execute(
    mut config: Config,
    path: &Path,
    key: Option<&str>,
    value: Option<&str>,
) -> Result<()> {
    match (key, value) {
        // Show all config
        (None, None) => {
            println!("Configuration file: {:?}\n", path);
            println!("[gateway]");
            println!("  host = \"{}\"", config.gateway.host);
            println!("  port = {}", config.gateway.port);
            println!("  web_dir = {}", get_config_value(&config, "gateway.web_dir")?);
            println!("  max_message_chars = {}", config.gateway.max_message_chars);
            println!();
            println!("[daemon]");
            println!("  url = \"{}\"", config.daemon.url);
            println!("  model = \"{}\"", config.daemon.model);
            println!("  request_timeout_secs = {}", config.daemon.request_timeout_secs);
            println!("  connect_timeout_secs = {}", config.daemon.connect_timeout_secs);
            println!("  health_path = \"{}\"", config.daemon.health_path);
            println!();
            println!("[readiness]");
            println!("  max_attempts = {}", config.readiness.max_attempts);
            println!("  initial_backoff_ms = {}", config.readiness.initial_backoff_ms);
            println!("  max_backoff_ms = {}", config.readiness.max_backoff_ms);
            println!("  probe_timeout_ms = {}", config.readiness.probe_timeout_ms);
            println!();
            println!("[concurrency]");
            println!("  max_concurrent = {}", config.concurrency.max_concurrent);
            println!("  max_queue = {}", config.concurrency.max_queue);
            println!("  queue_timeout_secs = {}", config.concurrency.queue_timeout_secs);
            println!();
            println!("[agent]");
            println!("  workspace_root = {:?}", config.agent.workspace_root);
            println!("  tools = {:?}", config.agent.tools);
            println!("  history_limit = {}", config.agent.history_limit);
            println!("  max_sessions = {}", config.agent.max_sessions);
            println!();
            println!("[supervisor]");
            println!("  command = \"{}\"", config.supervisor.command);
            println!("  args = {:?}", config.supervisor.args);
            println!("  shutdown_grace_secs = {}", config.supervisor.shutdown_grace_secs);
        }

        // Get a specific key
        (Some(key), None) => {
            let value = get_config_value(&config, key)?;
            println!("{}", value);
        }

        // Set a specific key
        (Some(key), Some(value)) => {
            set_config_value(&mut config, key, value)?;
            config.save_to(path)?;
            println!("Set {} = {}", key, value);
        }

        (None, Some(_)) => anyhow::bail!("A key is required when setting a value"),
    }

    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_config_value(config: &Config, key: &str) -> Result<String> {
    match key {
        "gateway.host" => Ok(config.gateway.host.clone()),
        "gateway.port" => Ok(config.gateway.port.to_string()),
        "gateway.web_dir" => Ok(config
            .gateway
            .web_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string())),
        "gateway.max_message_chars" => Ok(config.gateway.max_message_chars.to_string()),
        "daemon.url" => Ok(config.daemon.url.clone()),
        "daemon.model" => Ok(config.daemon.model.clone()),
        "daemon.request_timeout_secs" => Ok(config.daemon.request_timeout_secs.to_string()),
        "daemon.connect_timeout_secs" => Ok(config.daemon.connect_timeout_secs.to_string()),
        "daemon.health_path" => Ok(config.daemon.health_path.clone()),
        "readiness.max_attempts" => Ok(config.readiness.max_attempts.to_string()),
        "readiness.initial_backoff_ms" => Ok(config.readiness.initial_backoff_ms.to_string()),
        "readiness.max_backoff_ms" => Ok(config.readiness.max_backoff_ms.to_string()),
        "readiness.probe_timeout_ms" => Ok(config.readiness.probe_timeout_ms.to_string()),
        "concurrency.max_concurrent" => Ok(config.concurrency.max_concurrent.to_string()),
        "concurrency.max_queue" => Ok(config.concurrency.max_queue.to_string()),
        "concurrency.queue_timeout_secs" => Ok(config.concurrency.queue_timeout_secs.to_string()),
        "agent.workspace_root" => Ok(config.agent.workspace_root.display().to_string()),
        "agent.tools" => Ok(config.agent.tools.join(",")),
        "agent.history_limit" => Ok(config.agent.history_limit.to_string()),
        "agent.max_sessions" => Ok(config.agent.max_sessions.to_string()),
        "supervisor.command" => Ok(config.supervisor.command.clone()),
        "supervisor.args" => Ok(config.supervisor.args.join(" ")),
        "supervisor.shutdown_grace_secs" => Ok(config.supervisor.shutdown_grace_secs.to_string()),
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "gateway.host" => config.gateway.host = value.to_string(),
        "gateway.port" => config.gateway.port = value.parse()?,
        "gateway.web_dir" => {
            config.gateway.web_dir = if value.is_empty() {
                None
            } else {
                Some(value.into())
            }
        }
        "gateway.max_message_chars" => config.gateway.max_message_chars = value.parse()?,
        "daemon.url" => config.daemon.url = value.to_string(),
        "daemon.model" => config.daemon.model = value.to_string(),
        "daemon.request_timeout_secs" => config.daemon.request_timeout_secs = value.parse()?,
        "daemon.connect_timeout_secs" => config.daemon.connect_timeout_secs = value.parse()?,
        "daemon.health_path" => config.daemon.health_path = value.to_string(),
        "readiness.max_attempts" => config.readiness.max_attempts = value.parse()?,
        "readiness.initial_backoff_ms" => config.readiness.initial_backoff_ms = value.parse()?,
        "readiness.max_backoff_ms" => config.readiness.max_backoff_ms = value.parse()?,
        "readiness.probe_timeout_ms" => config.readiness.probe_timeout_ms = value.parse()?,
        "concurrency.max_concurrent" => config.concurrency.max_concurrent = value.parse()?,
        "concurrency.max_queue" => config.concurrency.max_queue = value.parse()?,
        "concurrency.queue_timeout_secs" => config.concurrency.queue_timeout_secs = value.parse()?,
        "agent.workspace_root" => config.agent.workspace_root = value.into(),
        "agent.tools" => config.agent.tools = split_list(value),
        "agent.history_limit" => config.agent.history_limit = value.parse()?,
        "agent.max_sessions" => config.agent.max_sessions = value.parse()?,
        "supervisor.command" => config.supervisor.command = value.to_string(),
        "supervisor.args" => {
            config.supervisor.args = value.split_whitespace().map(str::to_string).collect()
        }
        "supervisor.shutdown_grace_secs" => config.supervisor.shutdown_grace_secs = value.parse()?,
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
    Ok(())
}
