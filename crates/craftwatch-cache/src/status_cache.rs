//! Single-slot cache for the monitored server's status snapshot
//!
//! There is one monitored server, so the keyspace has size one. A stale
//! entry is kept until a successful refresh replaces it.

use crate::entry::CacheEntry;
use crate::error::{CacheError, CacheResult};
use crate::stats::{CacheMetrics, CacheStats};
use parking_lot::RwLock;
use std::future::Future;
use std::time::{Duration, Instant};

/// Memoizes the latest status snapshot for a fixed TTL.
///
/// The lock is only held for the read or the write itself, never across the
/// fetch, so concurrent misses may each fetch independently. The last
/// successful fetch wins, unless it carries an older timestamp than the
/// entry already stored.
#[derive(Debug)]
pub struct StatusCache<T> {
    slot: RwLock<Option<CacheEntry<T>>>,
    ttl: Duration,
    metrics: CacheMetrics,
}

impl<T: Clone> StatusCache<T> {
    /// Create an empty cache.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidConfiguration` if `ttl` is zero.
    pub fn new(ttl: Duration) -> CacheResult<Self> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidConfiguration(
                "status TTL must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            slot: RwLock::new(None),
            ttl,
            metrics: CacheMetrics::default(),
        })
    }

    /// Configured TTL
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value if it is fresh at `now`
    pub fn get_fresh(&self, now: Instant) -> Option<T> {
        let fresh = self
            .slot
            .read()
            .as_ref()
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.value().clone());

        self.metrics.record_get(fresh.is_some());
        fresh
    }

    /// Current entry regardless of freshness
    pub fn peek(&self) -> Option<CacheEntry<T>> {
        self.slot.read().clone()
    }

    /// Store `value` as of `now`.
    ///
    /// Returns `false` and leaves the slot untouched when the present entry
    /// was stored after `now`.
    pub fn store(&self, value: T, now: Instant) -> bool {
        let mut slot = self.slot.write();
        if slot.as_ref().is_some_and(|entry| entry.stored_at() > now) {
            drop(slot);
            self.metrics.record_rejected_write();
            tracing::debug!("Discarding status snapshot older than the cached one");
            return false;
        }

        *slot = Some(CacheEntry::new(value, now));
        drop(slot);
        self.metrics.record_insert();
        true
    }

    /// Return the fresh value, or run `fetch` once and cache its success.
    ///
    /// A failed fetch leaves any existing entry, including its `stored_at`,
    /// untouched and hands the error to this caller only.
    pub async fn get_or_fetch<F, Fut, E>(&self, now: Instant, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get_fresh(now) {
            tracing::trace!("Status cache hit");
            return Ok(value);
        }

        tracing::debug!("Status cache miss, fetching a new snapshot");
        match fetch().await {
            Ok(value) => {
                self.store(value.clone(), now);
                Ok(value)
            }
            Err(err) => {
                self.metrics.record_fetch_failure();
                Err(err)
            }
        }
    }

    /// Statistics snapshot
    pub fn stats(&self) -> CacheStats {
        let entries = usize::from(self.slot.read().is_some());
        self.metrics.snapshot(entries)
    }
}
