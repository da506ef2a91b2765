//! Service configuration management.
//!
//! Configuration is loaded from CLI arguments and environment variables and
//! validated before the server starts.
//!
//! # Configuration Sources
//!
//! - CLI arguments (`--server-host`, `--rcon-password`, etc.)
//! - Environment variables (`CRAFTWATCH_SERVER_HOST`, `RCON_PASSWORD`, `PORT`, etc.)
//! - Default values, which start the service in query-only mode
//!
//! # Example
//!
//! ```no_run
//! use craftwatch_api::ServerConfig;
//!
//! let config = ServerConfig::from_args();
//! config.validate().expect("Invalid configuration");
//!
//! println!("Listening on: {}", config.listen_addr());
//! println!("Monitoring: {}", config.server_address());
//! println!("Console enrichment: {}", config.console_enabled());
//! ```

use crate::error::ConfigError;
use clap::Parser;
use craftwatch_protocol::{DEFAULT_PROFILE_API, ServerAddress};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Service configuration loaded from CLI args and environment variables.
#[derive(Clone, Parser)]
#[command(
    name = "craftwatch",
    about = "HTTP status API for a Minecraft server",
    version
)]
pub struct ServerConfig {
    /// HTTP bind address
    #[arg(long, env = "CRAFTWATCH_HTTP_BIND", default_value = "0.0.0.0:5000")]
    pub http_bind: SocketAddr,

    /// Listen port, overriding the port of `http_bind`
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Display name of the monitored server
    #[arg(long, env = "CRAFTWATCH_SERVER_NAME", default_value = "Minecraft Server")]
    pub server_name: String,

    /// Host of the monitored server
    #[arg(long, env = "CRAFTWATCH_SERVER_HOST", default_value = "127.0.0.1")]
    pub server_host: String,

    /// Game port of the monitored server
    #[arg(long, env = "CRAFTWATCH_SERVER_PORT", default_value_t = 25565)]
    pub server_port: u16,

    /// RCON host (defaults to the server host)
    #[arg(long, env = "CRAFTWATCH_RCON_HOST")]
    pub rcon_host: Option<String>,

    /// RCON port
    #[arg(long, env = "RCON_PORT", default_value_t = 25575)]
    pub rcon_port: u16,

    /// RCON password (console enrichment is disabled when unset)
    #[arg(long, env = "RCON_PASSWORD", hide_env_values = true)]
    pub rcon_password: Option<String>,

    /// Enrich players from the public profile service
    #[arg(long, env = "CRAFTWATCH_PROFILE_LOOKUP")]
    pub profile_lookup: bool,

    /// Base URL of the profile service
    #[arg(long, env = "CRAFTWATCH_PROFILE_API_URL", default_value = DEFAULT_PROFILE_API)]
    pub profile_api_url: String,

    /// Seconds a status snapshot stays fresh
    #[arg(long, env = "CRAFTWATCH_STATUS_TTL_SECS", default_value_t = 10)]
    pub status_ttl_secs: u64,

    /// Seconds a player enrichment stays fresh
    #[arg(long, env = "CRAFTWATCH_PLAYER_TTL_SECS", default_value_t = 60)]
    pub player_ttl_secs: u64,

    /// Maximum number of cached player enrichments
    #[arg(long, env = "CRAFTWATCH_PLAYER_CACHE_CAPACITY", default_value_t = 1024)]
    pub player_cache_capacity: usize,

    /// Console calls allowed per window
    #[arg(long, env = "CRAFTWATCH_RCON_LIMIT", default_value_t = 10)]
    pub rcon_limit: u32,

    /// Length of the console rate limit window in seconds
    #[arg(long, env = "CRAFTWATCH_RCON_WINDOW_SECS", default_value_t = 60)]
    pub rcon_window_secs: u64,

    /// Timeout of one status or ping exchange in seconds
    #[arg(long, env = "CRAFTWATCH_QUERY_TIMEOUT_SECS", default_value_t = 5)]
    pub query_timeout_secs: u64,

    /// Timeout of one enrichment field in seconds
    #[arg(long, env = "CRAFTWATCH_FIELD_TIMEOUT_SECS", default_value_t = 5)]
    pub field_timeout_secs: u64,

    /// Timeout of a whole HTTP request in seconds
    #[arg(long, env = "CRAFTWATCH_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("listen_addr", &self.listen_addr())
            .field("server_name", &self.server_name)
            .field("server", &self.server_address())
            .field("rcon", &self.rcon_address())
            .field("console_enabled", &self.console_enabled())
            .field("profile_lookup", &self.profile_lookup)
            .field("profile_api_url", &self.profile_api_url)
            .finish_non_exhaustive()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            port: None,
            server_name: "Minecraft Server".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 25565,
            rcon_host: None,
            rcon_port: 25575,
            rcon_password: None,
            profile_lookup: false,
            profile_api_url: DEFAULT_PROFILE_API.to_string(),
            status_ttl_secs: 10,
            player_ttl_secs: 60,
            player_cache_capacity: 1024,
            rcon_limit: 10,
            rcon_window_secs: 60,
            query_timeout_secs: 5,
            field_timeout_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Address the HTTP server binds to, with `port` applied.
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        let mut addr = self.http_bind;
        if let Some(port) = self.port {
            addr.set_port(port);
        }
        addr
    }

    /// Game address of the monitored server.
    #[must_use]
    pub fn server_address(&self) -> ServerAddress {
        ServerAddress::new(self.server_host.trim(), self.server_port)
    }

    /// RCON address, falling back to the server host.
    #[must_use]
    pub fn rcon_address(&self) -> ServerAddress {
        let host = self
            .rcon_host
            .as_deref()
            .map_or(self.server_host.trim(), str::trim);
        ServerAddress::new(host, self.rcon_port)
    }

    /// Whether console enrichment is configured.
    #[must_use]
    pub fn console_enabled(&self) -> bool {
        self.rcon_password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Whether any enrichment source is configured.
    #[must_use]
    pub fn enrichment_enabled(&self) -> bool {
        self.console_enabled() || self.profile_lookup
    }

    #[must_use]
    pub const fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }

    #[must_use]
    pub const fn player_ttl(&self) -> Duration {
        Duration::from_secs(self.player_ttl_secs)
    }

    #[must_use]
    pub const fn rcon_window(&self) -> Duration {
        Duration::from_secs(self.rcon_window_secs)
    }

    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    #[must_use]
    pub const fn field_timeout(&self) -> Duration {
        Duration::from_secs(self.field_timeout_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The server host (or an explicit RCON host) is empty
    /// - Any TTL, limit, capacity or timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_host.trim().is_empty() {
            return Err(ConfigError::MissingRequired("server host".to_string()));
        }
        if self.rcon_host.as_deref().is_some_and(|h| h.trim().is_empty()) {
            return Err(ConfigError::MissingRequired("RCON host".to_string()));
        }

        let non_zero = [
            ("status_ttl_secs", self.status_ttl_secs),
            ("player_ttl_secs", self.player_ttl_secs),
            ("player_cache_capacity", self.player_cache_capacity as u64),
            ("rcon_limit", u64::from(self.rcon_limit)),
            ("rcon_window_secs", self.rcon_window_secs),
            ("query_timeout_secs", self.query_timeout_secs),
            ("field_timeout_secs", self.field_timeout_secs),
            ("request_timeout_secs", self.request_timeout_secs),
        ];
        if let Some((field, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::InvalidValue {
                field: (*field).to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.profile_lookup && self.profile_api_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired("profile API URL".to_string()));
        }

        Ok(())
    }
}
