//! Interactive chat command

use anyhow::{Context, Result};
use localgate_agent::{Agent, ChatOptions, ToolRegistry};
use localgate_backend::{OllamaClient, ReadinessPolicy};
use localgate_core::Config;
use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::daemon::shutdown_signal;

pub async fn execute(config: &Config, model: Option<String>, use_tools: bool) -> Result<()> {
    let client = OllamaClient::new(&config.daemon, &config.readiness)?;

    // Check if daemon is running
    client
        .wait_until_ready(&ReadinessPolicy::once())
        .await
        .context("Model daemon is not running. Start it with `localgate daemon`")?;

    let tools = ToolRegistry::from_names(&config.agent.tools, &config.agent.workspace_root)?;
    let mut agent = Agent::new(Arc::new(client), Arc::new(tools))
        .with_history_limit(config.agent.history_limit);
    let options = ChatOptions {
        use_tools,
        model,
    };

    println!(
        "Chatting with {} (Ctrl+C or Ctrl+D to exit)",
        options.model.as_deref().unwrap_or(&config.daemon.model)
    );
    if use_tools {
        println!("Tool invocation is enabled.");
    } else {
        println!("Tool invocation is disabled. Use --use-tools to enable.");
    }
    println!("---");

    let stdin = BufReader::new(tokio::io::stdin());
    repl(&mut agent, &options, stdin, shutdown_signal()).await?;

    Ok(())
}

/// Read messages from `input` until EOF or `shutdown`, returning the number
/// of messages sent to the agent
async fn repl<R, F>(agent: &mut Agent, options: &ChatOptions, input: R, shutdown: F) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut lines = input.lines();
    let mut sent = 0;

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut shutdown => {
                println!();
                break;
            }
        };

        // EOF
        let Some(line) = line else {
            println!();
            break;
        };

        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        sent += 1;
        tokio::select! {
            result = agent.chat(message, options) => match result {
                Ok(reply) => {
                    println!("Agent: {}", reply);
                    println!();
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                }
            },
            _ = &mut shutdown => {
                println!("\nInterrupted.");
                break;
            }
        }
    }

    Ok(sent)
}
