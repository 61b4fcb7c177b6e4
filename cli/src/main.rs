mod commands;
mod daemon;

use anyhow::Result;
use clap::{Parser, Subcommand};
use localgate_core::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "localgate")]
#[command(author, version, about = "Gateway and supervisor for a local model daemon", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/localgate/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway against an already running daemon
    Serve {
        /// Port to listen on (default: $PORT, then config, then 8000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Start without waiting for the daemon to be ready
        #[arg(long)]
        skip_readiness: bool,
    },

    /// Start the model daemon and the gateway together
    Up {
        /// Port to listen on (default: $PORT, then config, then 8000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the model daemon under supervision
    Daemon,

    /// Chat with the agent from the terminal
    Chat {
        /// Model to use (default: daemon.model from config)
        #[arg(short, long)]
        model: Option<String>,

        /// Allow the agent to invoke tools
        #[arg(long)]
        use_tools: bool,
    },

    /// Show daemon and gateway status
    Status {
        /// Gateway port to check (default: $PORT, then config, then 8000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the tools the agent may use
    Tools,

    /// View or set configuration
    Config {
        /// Config key (e.g., "gateway.port", "daemon.model")
        key: Option<String>,

        /// Value to set (if omitted, shows current value)
        value: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let config = Config::load_from(&config_path)?;

    match cli.command {
        Commands::Serve {
            port,
            skip_readiness,
        } => {
            commands::serve::execute(config, port, skip_readiness).await?;
        }
        Commands::Up { port } => {
            commands::up::execute(config, port).await?;
        }
        Commands::Daemon => {
            commands::daemon::execute(&config).await?;
        }
        Commands::Chat { model, use_tools } => {
            commands::chat::execute(&config, model, use_tools).await?;
        }
        Commands::Status { port } => {
            commands::status::execute(&config, port).await?;
        }
        Commands::Tools => {
            commands::tools::execute(&config)?;
        }
        Commands::Config { key, value } => {
            commands::config::execute(config, &config_path, key.as_deref(), value.as_deref())?;
        }
    }

    Ok(())
}
