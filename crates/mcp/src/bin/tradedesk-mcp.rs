// Standalone MCP server binary.

use anyhow::{Context, Result};
use std::sync::Arc;
use tradedesk_broker::{AlpacaClient, BrokerConfig, Brokerage};
use tradedesk_mcp::server::McpServer;
use tradedesk_mcp::tools::standard_registry;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the protocol stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = BrokerConfig::from_env().context("brokerage credentials are required")?;
    if config.paper {
        tracing::info!("paper trading venue selected");
    } else {
        tracing::warn!("live trading venue selected: orders will reach a real account");
    }

    let broker: Arc<dyn Brokerage> =
        Arc::new(AlpacaClient::new(&config).context("failed to build brokerage client")?);

    let registry = standard_registry(broker);
    tracing::info!("registered {} tools", registry.len());

    McpServer::new(registry).serve().await
}
