//! Host and port of a remote endpoint

use crate::error::{ProtocolError, Result};
use std::fmt;

/// Default port of the server list ping protocol
pub const DEFAULT_QUERY_PORT: u16 = 25565;

/// Default RCON port
pub const DEFAULT_RCON_PORT: u16 = 25575;

/// A `host:port` pair.
///
/// The host is kept verbatim: the server list ping handshake sends it to the
/// server, and some proxies route on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host` or `host:port`, using `default_port` when no port is given.
    pub fn parse(input: &str, default_port: u16) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ProtocolError::InvalidEndpoint(
                "empty server address".to_string(),
            ));
        }

        if let Some(colon_pos) = input.rfind(':') {
            let host = &input[..colon_pos];
            let port = input[colon_pos + 1..]
                .parse::<u16>()
                .map_err(|_| ProtocolError::InvalidEndpoint(format!("Invalid port in address: {input}")))?;
            if host.is_empty() {
                return Err(ProtocolError::InvalidEndpoint(format!(
                    "Missing host in address: {input}"
                )));
            }
            Ok(Self::new(host, port))
        } else {
            Ok(Self::new(input, default_port))
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
