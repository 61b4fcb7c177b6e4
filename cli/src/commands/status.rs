use anyhow::Result;
use localgate_backend::{OllamaClient, ProbeOutcome};
use localgate_core::Config;
use std::time::Duration;

/// Check gateway health via HTTP
async fn check_gateway(port: u16) -> bool {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap_or_default();

    match client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
    {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

pub async fn execute(config: &Config, port: Option<u16>) -> Result<()> {
    println!("localgate status\n");

    let client = OllamaClient::new(&config.daemon, &config.readiness)?;
    let daemon_ready = match client.probe().await {
        ProbeOutcome::Ready => {
            println!("Model daemon: ready ({})", client.base_url());
            true
        }
        ProbeOutcome::NotReady(reason) => {
            println!("Model daemon: not ready ({}, {})", client.base_url(), reason);
            false
        }
        ProbeOutcome::Unreachable(_) => {
            println!("Model daemon: not running ({})", client.base_url());
            false
        }
    };

    if daemon_ready {
        match client.list_models().await {
            Ok(models) => {
                println!("Models: {}", models.len());
                for model in models {
                    let marker = if model == config.daemon.model { "*" } else { " " };
                    println!("  {} {}", marker, model);
                }
            }
            Err(e) => println!("Models: unavailable ({})", e),
        }
    }

    let port = config.gateway_port(port)?;
    let gateway_running = check_gateway(port).await;
    println!(
        "Gateway: {} (port {})",
        if gateway_running { "running" } else { "not running" },
        port
    );

    if !daemon_ready {
        println!("\nRun `localgate daemon` or `localgate up` to start the model daemon.");
    } else if !gateway_running {
        println!("\nRun `localgate serve` to start the gateway.");
    }

    Ok(())
}
