//! Error types for cache construction

use thiserror::Error;

/// Errors raised while building caches and limiters
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    /// Invalid cache or limiter configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result alias for cache construction
pub type CacheResult<T> = Result<T, CacheError>;
