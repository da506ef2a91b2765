//! In-memory caching and rate limiting for the craftwatch status API.
//!
//! The crate holds the only mutable state of the service:
//!
//! - [`StatusCache`]: a single-slot cache for the monitored server's status
//!   snapshot, refreshed at most once per TTL.
//! - [`PlayerEnrichmentCache`]: per-player enrichment results keyed by
//!   player name, with a longer TTL and a soft capacity bound.
//! - [`RateLimiter`]: a fixed-window counter guarding the administrative
//!   console channel.
//!
//! All timestamps are supplied by the caller as [`std::time::Instant`]
//! values. Expiry is evaluated lazily on read; nothing runs in the
//! background.
//!
//! # Example
//!
//! ```rust
//! use craftwatch_cache::{Lookup, PlayerEnrichmentCache, RateLimiter};
//! use std::time::{Duration, Instant};
//!
//! # fn main() -> Result<(), craftwatch_cache::CacheError> {
//! let cache = PlayerEnrichmentCache::new(Duration::from_secs(60), 128)?;
//! let limiter = RateLimiter::new(10, Duration::from_secs(60))?;
//! let now = Instant::now();
//!
//! if matches!(cache.lookup("Steve", now), Lookup::Missing) && limiter.try_acquire(now) {
//!     cache.insert("Steve", "balance: 100".to_string(), now);
//! }
//!
//! assert!(matches!(cache.lookup("Steve", now), Lookup::Fresh(_)));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod entry;
pub mod error;
pub mod player_cache;
pub mod rate_limit;
pub mod stats;
pub mod status_cache;

pub use entry::{CacheEntry, Lookup};
pub use error::{CacheError, CacheResult};
pub use player_cache::PlayerEnrichmentCache;
pub use rate_limit::RateLimiter;
pub use stats::CacheStats;
pub use status_cache::StatusCache;
