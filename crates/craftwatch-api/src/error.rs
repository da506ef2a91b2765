//! Error types for the status API.
//!
//! All errors use thiserror for consistent error handling across the codebase.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use craftwatch_cache::CacheError;
use craftwatch_protocol::ProtocolError;
use serde::Serialize;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric setting is out of range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the offending setting
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Missing required configuration value
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Server runtime errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind HTTP server
    #[error("Failed to bind HTTP server to {addr}: {source}")]
    HttpBindFailed {
        /// Address that failed to bind
        addr: std::net::SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cache or rate limiter could not be built
    #[error("Cache configuration error: {0}")]
    Cache(#[from] CacheError),

    /// An upstream client could not be built
    #[error("Client setup error: {0}")]
    Client(#[from] ProtocolError),

    /// Server shutdown error
    #[error("Server shutdown error: {0}")]
    Shutdown(String),
}

/// Request-level failure reported to HTTP clients.
///
/// Every variant renders the same JSON envelope:
/// `{"success": false, "error": ..., "message": ..., "server": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The monitored server could not be queried (500)
    #[error("{detail}")]
    Unreachable {
        /// Display name of the monitored server
        server: String,
        /// Underlying failure
        detail: String,
    },

    /// The request did not complete in time (504)
    #[error("{detail}")]
    Timeout {
        /// Display name of the monitored server
        server: String,
        /// Which deadline expired
        detail: String,
    },

    /// No route matches the request path (404)
    #[error("Endpoint not found")]
    NotFound {
        /// Display name of the monitored server
        server: String,
    },
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    error: String,
    message: String,
    server: &'a str,
}

impl ApiError {
    /// Classify a failed query: expired deadlines become `Timeout`,
    /// everything else `Unreachable`.
    pub fn from_protocol(server: &str, err: &ProtocolError) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                server: server.to_string(),
                detail: err.to_string(),
            }
        } else {
            Self::Unreachable {
                server: server.to_string(),
                detail: err.to_string(),
            }
        }
    }

    /// The whole request exceeded its deadline.
    pub fn request_timeout(server: &str, seconds: u64) -> Self {
        Self::Timeout {
            server: server.to_string(),
            detail: format!("Request timed out after {seconds}s"),
        }
    }

    pub fn not_found(server: &str) -> Self {
        Self::NotFound {
            server: server.to_string(),
        }
    }

    /// HTTP status for this error.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unreachable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    fn server(&self) -> &str {
        match self {
            Self::Unreachable { server, .. }
            | Self::Timeout { server, .. }
            | Self::NotFound { server } => server,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Unreachable { server, .. } => format!("Error connecting to {server}"),
            Self::Timeout { server, .. } => format!("{server} did not respond in time"),
            Self::NotFound { .. } => {
                "Check the URL and the endpoints listed at '/'".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::NotFound { .. } => tracing::debug!("Unknown endpoint requested"),
            _ => tracing::warn!("Request failed with {status}: {self}"),
        }

        let body = ErrorEnvelope {
            success: false,
            error: self.to_string(),
            message: self.message(),
            server: self.server(),
        };
        (status, axum::Json(body)).into_response()
    }
}
