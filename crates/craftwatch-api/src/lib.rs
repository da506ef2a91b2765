//! Minecraft server status API.
//!
//! This crate serves the live status of one Minecraft server over HTTP:
//! player counts, latency, version and a per-player record with avatar URLs
//! and optional enrichment (console balance, playtime and last seen, or the
//! account UUID from the profile service).
//!
//! # Architecture
//!
//! - `config`: configuration loading and validation
//! - `server`: shared state and server orchestration
//! - `enrichment`: per-player enrichment behind the player cache and the
//!   console rate limiter
//! - `responses`: JSON bodies built from status snapshots
//! - `http`: axum router and handlers
//!
//! # Example
//!
//! ```no_run
//! use craftwatch_api::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     tracing_subscriber::fmt::init();
//!
//!     let config = ServerConfig::from_args();
//!     config.validate()?;
//!
//!     let server = Server::new(config)?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod enrichment;
pub mod error;
pub mod http;
pub mod responses;
pub mod server;

pub use config::ServerConfig;
pub use enrichment::{
    ConsoleEnricher, Enricher, EnrichmentOrchestrator, EnrichmentResult, FieldValue,
    ProfileEnricher,
};
pub use error::{ApiError, ConfigError, ServerError};
pub use responses::{PlayerRecord, ResponseAssembler};
pub use server::{AppState, Server};
