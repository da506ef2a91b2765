//! Cache statistics
//!
//! Counters are plain relaxed atomics; a [`CacheStats`] snapshot is not a
//! consistent cut across counters, which is fine for diagnostics.

#![allow(clippy::cast_precision_loss)] // Rates are reported as approximate ratios

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads answered from a fresh entry
    pub hit_count: u64,
    /// Reads that found no entry or only a stale one
    pub miss_count: u64,
    /// Stale entries handed out as a fallback
    pub stale_served_count: u64,
    /// Successful writes
    pub insert_count: u64,
    /// Writes dropped because a newer entry was already present
    pub rejected_write_count: u64,
    /// Refreshes whose fetch failed, leaving the old entry in place
    pub fetch_failure_count: u64,
    /// Entries removed to stay within capacity
    pub eviction_count: u64,
    /// Entries currently held
    pub entry_count: usize,
}

impl CacheStats {
    /// Total reads
    #[inline]
    pub const fn get_count(&self) -> u64 {
        self.hit_count + self.miss_count
    }

    /// Calculate hit rate (hits / total reads)
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let gets = self.get_count();
        if gets == 0 {
            0.0
        } else {
            self.hit_count as f64 / gets as f64
        }
    }
}

/// Lock-free counters shared by the cache implementations
#[derive(Debug, Default)]
pub(crate) struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    stale_served: AtomicU64,
    inserts: AtomicU64,
    rejected_writes: AtomicU64,
    fetch_failures: AtomicU64,
    evictions: AtomicU64,
}

impl CacheMetrics {
    #[inline]
    pub(crate) fn record_get(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_stale_served(&self) {
        self.stale_served.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejected_write(&self) {
        self.rejected_writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entry_count: usize) -> CacheStats {
        CacheStats {
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            stale_served_count: self.stale_served.load(Ordering::Relaxed),
            insert_count: self.inserts.load(Ordering::Relaxed),
            rejected_write_count: self.rejected_writes.load(Ordering::Relaxed),
            fetch_failure_count: self.fetch_failures.load(Ordering::Relaxed),
            eviction_count: self.evictions.load(Ordering::Relaxed),
            entry_count,
        }
    }
}
