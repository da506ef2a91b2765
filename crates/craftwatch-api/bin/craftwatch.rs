//! craftwatch binary entry point.
//!
//! This is a thin wrapper around the craftwatch-api library that:
//! 1. Initializes logging
//! 2. Parses and validates configuration
//! 3. Starts the server

use anyhow::Result;
use craftwatch_api::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("craftwatch starting...");

    let config = ServerConfig::from_args();

    tracing::info!(
        "Configuration loaded: HTTP={}, server={}, enrichment={}, console={}",
        config.listen_addr(),
        config.server_address(),
        config.enrichment_enabled(),
        config.console_enabled()
    );

    config.validate()?;

    let server = Server::new(config)?;
    server.run().await?;

    Ok(())
}
