use client_core::observability::init_tracing;
use docuchat_client::config::ClientConfig;
use docuchat_client::startup::run;
use dotenvy::dotenv;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = ClientConfig::load().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "docuchat-client",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    );

    tracing::info!(base_url = %configuration.api.base_url, "Starting docuchat");

    let input = BufReader::new(tokio::io::stdin());
    let mut output = std::io::stdout();
    run(&configuration, input, &mut output).await.map_err(|e| {
        tracing::error!(error = %e, "Session ended with an error");
        e
    })?;

    Ok(())
}
