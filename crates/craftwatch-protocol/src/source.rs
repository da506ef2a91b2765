//! Abstractions over the remote endpoints
//!
//! The API layer depends on these traits rather than on the concrete
//! clients so it can be driven by in-process fakes.

use crate::error::Result;
use crate::profile::{Profile, ProfileClient};
use crate::query::QueryClient;
use crate::rcon::RconClient;
use crate::status::ServerStatus;
use async_trait::async_trait;
use tracing::debug;

/// Source of the server's public status
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch a fresh status snapshot.
    async fn status(&self) -> Result<ServerStatus>;

    /// Measure the round trip to the server in milliseconds.
    async fn ping(&self) -> Result<f64>;
}

/// Administrative console able to run commands
#[async_trait]
pub trait ConsoleSource: Send + Sync {
    /// Run `commands` over one connection.
    ///
    /// The outer error means the console could not be reached or refused
    /// the credentials. Each inner result belongs to the command at the
    /// same position.
    async fn run_batch(&self, commands: &[String]) -> Result<Vec<Result<String>>>;
}

/// Directory of player accounts
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<Profile>;
}

#[async_trait]
impl StatusSource for QueryClient {
    async fn status(&self) -> Result<ServerStatus> {
        Self::status(self).await
    }

    async fn ping(&self) -> Result<f64> {
        Self::ping(self).await
    }
}

#[async_trait]
impl ConsoleSource for RconClient {
    async fn run_batch(&self, commands: &[String]) -> Result<Vec<Result<String>>> {
        let mut session = self.connect().await?;

        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let result = session.command(command).await;
            if let Err(e) = &result {
                debug!("RCON command {command:?} failed: {e}");
            }
            results.push(result);
        }
        Ok(results)
    }
}

#[async_trait]
impl ProfileSource for ProfileClient {
    async fn lookup(&self, name: &str) -> Result<Profile> {
        Self::lookup(self, name).await
    }
}
