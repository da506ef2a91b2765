//! Cache and rate limit coordination for enrichment

use super::{Enricher, EnrichmentResult, RATE_LIMITED, TIMED_OUT};
use craftwatch_cache::{Lookup, PlayerEnrichmentCache, RateLimiter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Decides, per player, whether to answer from cache, refresh through the
/// enricher, or degrade.
///
/// Each call makes at most one limiter acquisition and at most one cache
/// write. A denied refresh never fails: it falls back to the stale entry,
/// or to [`EnrichmentResult::Unavailable`] when there is none.
pub struct EnrichmentOrchestrator {
    cache: PlayerEnrichmentCache<EnrichmentResult>,
    limiter: RateLimiter,
    enricher: Arc<dyn Enricher>,
}

impl EnrichmentOrchestrator {
    pub fn new(
        cache: PlayerEnrichmentCache<EnrichmentResult>,
        limiter: RateLimiter,
        enricher: Arc<dyn Enricher>,
    ) -> Self {
        Self {
            cache,
            limiter,
            enricher,
        }
    }

    pub const fn cache(&self) -> &PlayerEnrichmentCache<EnrichmentResult> {
        &self.cache
    }

    pub const fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn enricher_name(&self) -> &'static str {
        self.enricher.name()
    }

    /// Enrichment for `player` as of `now`, with no bound on the fetch.
    pub async fn enrich(&self, player: &str, now: Instant) -> EnrichmentResult {
        self.refresh(player, now, None).await
    }

    /// Enrichment for `player` as of `now`, giving the enricher at most
    /// `budget`.
    ///
    /// A fetch that runs out of budget yields `Unavailable("timeout")`,
    /// which is cached like any other result so the spent permit is not
    /// spent again until the entry expires. With no budget left at all the
    /// limiter is not consulted and nothing is written.
    pub async fn enrich_within(
        &self,
        player: &str,
        now: Instant,
        budget: Duration,
    ) -> EnrichmentResult {
        self.refresh(player, now, Some(budget)).await
    }

    async fn refresh(
        &self,
        player: &str,
        now: Instant,
        budget: Option<Duration>,
    ) -> EnrichmentResult {
        let stale = match self.cache.lookup(player, now) {
            Lookup::Fresh(result) => {
                debug!(player, "Enrichment cache hit");
                return result;
            }
            Lookup::Stale(result) => Some(result),
            Lookup::Missing => None,
        };

        if budget.is_some_and(|b| b.is_zero()) {
            debug!(player, "No time left for enrichment");
            return self.degrade(stale, TIMED_OUT);
        }

        if !self.limiter.try_acquire(now) {
            warn!(player, "Enrichment refresh denied by rate limiter");
            return self.degrade(stale, RATE_LIMITED);
        }

        debug!(player, enricher = self.enricher.name(), "Refreshing enrichment");
        let fetch = self.enricher.fetch(player);
        let result = match budget {
            Some(budget) => tokio::time::timeout(budget, fetch).await.unwrap_or_else(|_| {
                warn!(player, "Enrichment timed out after {budget:?}");
                EnrichmentResult::Unavailable(TIMED_OUT.to_string())
            }),
            None => fetch.await,
        };
        self.cache.insert(player, result.clone(), now);
        result
    }

    /// Stale entry if there is one, otherwise `Unavailable(reason)`.
    fn degrade(&self, stale: Option<EnrichmentResult>, reason: &str) -> EnrichmentResult {
        match stale {
            Some(result) => {
                self.cache.note_stale_served();
                result
            }
            None => EnrichmentResult::Unavailable(reason.to_string()),
        }
    }
}
