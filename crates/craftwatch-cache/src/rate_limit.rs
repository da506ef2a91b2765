//! Fixed-window rate limiting for the administrative console channel
//!
//! Windows roll over lazily: the check happens on each acquire, there is no
//! timer. A burst of up to twice the limit across a window boundary is
//! possible and accepted.

use crate::error::{CacheError, CacheResult};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Window {
    /// `None` until the first acquire opens a window
    start: Option<Instant>,
    count: u32,
}

/// Fixed-window counter capping calls per window.
///
/// Rollover, comparison and increment happen under one lock, so two callers
/// racing for the last permit can never both succeed.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    state: Mutex<Window>,
}

impl RateLimiter {
    /// Create a limiter granting `limit` permits per `window`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidConfiguration` if `limit` or `window` is
    /// zero.
    pub fn new(limit: u32, window: Duration) -> CacheResult<Self> {
        if limit == 0 {
            return Err(CacheError::InvalidConfiguration(
                "rate limit must allow at least one call per window".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(CacheError::InvalidConfiguration(
                "rate limit window must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            limit,
            window,
            state: Mutex::new(Window {
                start: None,
                count: 0,
            }),
        })
    }

    /// Permits per window
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Try to take one permit at `now`.
    ///
    /// Returns `false` without mutating the counter when the current window
    /// is exhausted. A `now` earlier than the window start never moves the
    /// window backward.
    pub fn try_acquire(&self, now: Instant) -> bool {
        let mut state = self.state.lock();

        match state.start {
            Some(start) if now.saturating_duration_since(start) < self.window => {}
            _ => {
                if state.start.is_some() {
                    tracing::trace!(previous = state.count, "Rate limit window rolled over");
                }
                state.start = Some(now);
                state.count = 0;
            }
        }

        if state.count >= self.limit {
            return false;
        }

        state.count += 1;
        true
    }

    /// Permits left in the window that is current at `now`
    pub fn remaining(&self, now: Instant) -> u32 {
        let state = self.state.lock();
        match state.start {
            Some(start) if now.saturating_duration_since(start) < self.window => {
                self.limit - state.count
            }
            _ => self.limit,
        }
    }
}
