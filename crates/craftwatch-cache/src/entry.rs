//! Timestamped cache entries

use std::time::{Duration, Instant};

/// A cached value together with the instant it was stored.
///
/// Entries are immutable. A refresh replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
}

impl<T> CacheEntry<T> {
    /// Create an entry stored at `stored_at`
    pub const fn new(value: T, stored_at: Instant) -> Self {
        Self { value, stored_at }
    }

    /// The cached value
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Consume the entry and return the value
    pub fn into_value(self) -> T {
        self.value
    }

    /// When the value was stored
    pub const fn stored_at(&self) -> Instant {
        self.stored_at
    }

    /// Age of the entry at `now`.
    ///
    /// A `now` earlier than `stored_at` yields zero.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    /// Whether the entry is still fresh at `now` for the given TTL
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Outcome of a cache read that does not fetch on miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Entry present and within its TTL
    Fresh(T),
    /// Entry present but older than its TTL
    Stale(T),
    /// No entry for the key
    Missing,
}

impl<T> Lookup<T> {
    /// Return the value if one is present, fresh or stale
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Fresh(value) | Self::Stale(value) => Some(value),
            Self::Missing => None,
        }
    }

    /// Whether the lookup found a fresh entry
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}
