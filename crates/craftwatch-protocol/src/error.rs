//! Error types for protocol operations

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status: {0}")]
    HttpStatus(StatusCode),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timeout")]
    Timeout,

    #[error("RCON authentication failed")]
    AuthenticationFailed,

    #[error("RCON session abandoned after a timed-out command")]
    SessionAbandoned,

    #[error("Packet of {size} bytes exceeds the {max} byte limit")]
    PacketTooLarge { size: usize, max: usize },

    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ProtocolError {
    /// Whether the error means a deadline expired, as opposed to the peer
    /// being unreachable or misbehaving.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Http(e) => e.is_timeout(),
            Self::Network(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        assert!(ProtocolError::Timeout.is_timeout());
        assert!(
            ProtocolError::Network(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "connect timed out"
            ))
            .is_timeout()
        );
        assert!(
            !ProtocolError::Network(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused"
            ))
            .is_timeout()
        );
        assert!(!ProtocolError::AuthenticationFailed.is_timeout());
    }

    #[test]
    fn test_error_messages() {
        let err = ProtocolError::PacketTooLarge {
            size: 5000,
            max: 4096,
        };
        assert_eq!(
            err.to_string(),
            "Packet of 5000 bytes exceeds the 4096 byte limit"
        );
        assert_eq!(
            ProtocolError::NotFound("Notch".to_string()).to_string(),
            "Profile not found: Notch"
        );
    }
}
