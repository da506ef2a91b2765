//! Per-player enrichment cache
//!
//! Keys are player names exactly as the query protocol reports them
//! (case-sensitive). Entries are never expired in the background: a stale
//! entry stays readable as a fallback until it is overwritten, or until it is
//! swept to make room for a new player once the cache reaches capacity.

use crate::entry::{CacheEntry, Lookup};
use crate::error::{CacheError, CacheResult};
use crate::stats::{CacheMetrics, CacheStats};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::future::Future;
use std::time::{Duration, Instant};

/// TTL cache keyed by player name.
///
/// Capacity is a soft bound: concurrent inserts of distinct new players may
/// overshoot it briefly, and the next insert of a new player sweeps again.
#[derive(Debug)]
pub struct PlayerEnrichmentCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    max_entries: usize,
    metrics: CacheMetrics,
}

impl<V: Clone> PlayerEnrichmentCache<V> {
    /// Create an empty cache.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidConfiguration` if `ttl` or `max_entries`
    /// is zero.
    pub fn new(ttl: Duration, max_entries: usize) -> CacheResult<Self> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidConfiguration(
                "player TTL must be greater than zero".to_string(),
            ));
        }
        if max_entries == 0 {
            return Err(CacheError::InvalidConfiguration(
                "player cache capacity must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            entries: DashMap::with_capacity(max_entries.min(1024)),
            ttl,
            max_entries,
            metrics: CacheMetrics::default(),
        })
    }

    /// Configured TTL
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Configured capacity
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Number of cached players
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no player is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the entry for `key` without fetching
    pub fn lookup(&self, key: &str, now: Instant) -> Lookup<V> {
        let lookup = match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now, self.ttl) => {
                Lookup::Fresh(entry.value().value().clone())
            }
            Some(entry) => Lookup::Stale(entry.value().value().clone()),
            None => Lookup::Missing,
        };

        self.metrics.record_get(lookup.is_fresh());
        lookup
    }

    /// Record that a stale entry was handed out in place of a refresh
    pub fn note_stale_served(&self) {
        self.metrics.record_stale_served();
    }

    /// Store `value` for `key` as of `now`.
    ///
    /// Returns `false` without writing when the present entry was stored
    /// after `now`, so a late result never replaces a newer one.
    pub fn insert(&self, key: &str, value: V, now: Instant) -> bool {
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.make_room(now);
        }

        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().stored_at() > now {
                    drop(occupied);
                    self.metrics.record_rejected_write();
                    tracing::debug!(player = key, "Discarding enrichment older than the cached one");
                    return false;
                }
                occupied.insert(CacheEntry::new(value, now));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::new(value, now));
            }
        }

        self.metrics.record_insert();
        true
    }

    /// Return the fresh value for `key`, or run `fetch` and cache the result.
    ///
    /// The fetch is infallible from the cache's point of view: enrichment
    /// failures are values, and they are cached like any other result.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, now: Instant, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Lookup::Fresh(value) = self.lookup(key, now) {
            return value;
        }

        let value = fetch().await;
        self.insert(key, value.clone(), now);
        value
    }

    /// Statistics snapshot
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.entries.len())
    }

    /// Drop stale entries, then the oldest entry if the map is still full.
    fn make_room(&self, now: Instant) {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.is_fresh(now, ttl));
        let mut evicted = before.saturating_sub(self.entries.len());

        while self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().stored_at())
                .map(|entry| entry.key().clone());

            match oldest {
                Some(key) => {
                    if self.entries.remove(&key).is_some() {
                        evicted += 1;
                    }
                }
                None => break,
            }
        }

        if evicted > 0 {
            self.metrics.record_evictions(evicted as u64);
            tracing::debug!(evicted, "Evicted player enrichment entries to stay within capacity");
        }
    }
}
