//! Server state management and orchestration.
//!
//! [`AppState`] owns every piece of mutable state (status cache, player
//! cache, rate limiter) together with the upstream clients. It is built once
//! at startup and shared with the HTTP handlers as `Arc<AppState>`.

use crate::config::ServerConfig;
use crate::enrichment::{
    ConsoleEnricher, Enricher, EnrichmentOrchestrator, EnrichmentResult, ProfileEnricher,
};
use crate::error::{ApiError, ServerError};
use crate::responses::{Features, ResponseAssembler, ServiceStats};
use craftwatch_cache::{PlayerEnrichmentCache, RateLimiter, StatusCache};
use craftwatch_protocol::{
    ProfileClient, ProtocolError, QueryClient, RconClient, ServerStatus, StatusSource,
};
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Shared application state for the HTTP handlers.
pub struct AppState {
    /// Upstream status query (server list ping in production)
    status_source: Arc<dyn StatusSource>,

    /// Short-lived cache of the last status snapshot
    status_cache: StatusCache<ServerStatus>,

    /// Absent in query-only mode
    enrichment: Option<EnrichmentOrchestrator>,

    assembler: ResponseAssembler,
    features: Features,

    /// Deadline for a whole request, status fetch and enrichment included
    request_timeout: Duration,

    /// Part of the request deadline, counted from the request start, that
    /// enrichment may use
    enrichment_budget: Duration,

    /// Server start time (for the service description)
    started_at: SystemTime,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("server", self.assembler.address())
            .field(
                "enricher",
                &self.enrichment.as_ref().map(EnrichmentOrchestrator::enricher_name),
            )
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create application state with the production clients.
    ///
    /// Console enrichment is used when an RCON password is configured,
    /// otherwise profile enrichment when enabled, otherwise none.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if a cache setting is invalid or the profile
    /// client cannot be built.
    pub fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        let query = QueryClient::new(config.server_address()).with_timeout(config.query_timeout());

        let enricher: Option<Arc<dyn Enricher>> = match config.rcon_password.as_deref() {
            _ if !config.enrichment_enabled() => None,
            Some(password) if config.console_enabled() => {
                let console = RconClient::new(config.rcon_address(), password)
                    .with_timeout(config.field_timeout());
                Some(Arc::new(ConsoleEnricher::new(Arc::new(console))))
            }
            _ if config.profile_lookup => {
                let profiles =
                    ProfileClient::new(&config.profile_api_url, config.field_timeout())?;
                Some(Arc::new(ProfileEnricher::new(
                    Arc::new(profiles),
                    config.field_timeout(),
                )))
            }
            _ => None,
        };

        Self::with_sources(config, Arc::new(query), enricher)
    }

    /// Create application state around caller-supplied sources.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Cache` if a TTL, limit or capacity is zero.
    pub fn with_sources(
        config: &ServerConfig,
        status_source: Arc<dyn StatusSource>,
        enricher: Option<Arc<dyn Enricher>>,
    ) -> Result<Self, ServerError> {
        let status_cache = StatusCache::new(config.status_ttl())?;

        let enrichment = match enricher {
            Some(enricher) => {
                tracing::info!("Player enrichment enabled ({})", enricher.name());
                Some(EnrichmentOrchestrator::new(
                    PlayerEnrichmentCache::new(config.player_ttl(), config.player_cache_capacity)?,
                    RateLimiter::new(config.rcon_limit, config.rcon_window())?,
                    enricher,
                ))
            }
            None => {
                tracing::info!("No enrichment source configured, serving query data only");
                None
            }
        };

        let features = Features {
            cache: format!(
                "Status cached for {}s, player data for {}s",
                config.status_ttl_secs, config.player_ttl_secs
            ),
            rate_limit: format!(
                "At most {} console requests per {}s",
                config.rcon_limit, config.rcon_window_secs
            ),
            essentials: enrichment
                .as_ref()
                .map_or_else(|| "disabled".to_string(), |e| {
                    format!("enabled ({})", e.enricher_name())
                }),
        };

        Ok(Self {
            status_source,
            status_cache,
            enrichment,
            assembler: ResponseAssembler::new(config.server_name.clone(), config.server_address()),
            features,
            request_timeout: config.request_timeout(),
            enrichment_budget: config.request_timeout() * 3 / 4,
            started_at: SystemTime::now(),
        })
    }

    #[must_use]
    pub const fn assembler(&self) -> &ResponseAssembler {
        &self.assembler
    }

    #[must_use]
    pub fn server_name(&self) -> &str {
        self.assembler.server_name()
    }

    #[must_use]
    pub const fn features(&self) -> &Features {
        &self.features
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[must_use]
    pub const fn status_cache(&self) -> &StatusCache<ServerStatus> {
        &self.status_cache
    }

    #[must_use]
    pub const fn enrichment(&self) -> Option<&EnrichmentOrchestrator> {
        self.enrichment.as_ref()
    }

    /// Status snapshot, from cache while fresh.
    ///
    /// # Errors
    ///
    /// Returns the query error when a refresh was needed and failed.
    pub async fn current_status(&self, now: Instant) -> Result<ServerStatus, ProtocolError> {
        self.status_cache
            .get_or_fetch(now, || self.status_source.status())
            .await
    }

    /// Uncached ping round trip in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns the query error if the server does not answer.
    pub async fn ping(&self) -> Result<f64, ProtocolError> {
        self.status_source.ping().await
    }

    /// Enrich every sampled player concurrently.
    ///
    /// `now` is the request start. Enrichment stops at three quarters of the
    /// request deadline, so a slow enrichment source degrades to
    /// `Unavailable("timeout")` entries instead of failing the request.
    ///
    /// Returns one entry per sampled player, or an empty list in query-only
    /// mode.
    pub async fn enrich_players(
        &self,
        status: &ServerStatus,
        now: Instant,
    ) -> Vec<Option<EnrichmentResult>> {
        let Some(enrichment) = &self.enrichment else {
            return Vec::new();
        };

        let budget = self.enrichment_budget.saturating_sub(now.elapsed());
        join_all(
            status
                .players
                .sample
                .iter()
                .map(|player| enrichment.enrich_within(&player.name, now, budget)),
        )
        .await
        .into_iter()
        .map(Some)
        .collect()
    }

    /// Map a query failure to its HTTP error.
    #[must_use]
    pub fn query_error(&self, err: &ProtocolError) -> ApiError {
        ApiError::from_protocol(self.server_name(), err)
    }

    /// Runtime counters as of `now`.
    #[must_use]
    pub fn stats(&self, now: Instant) -> ServiceStats {
        ServiceStats {
            uptime_seconds: self.uptime_seconds(),
            status_cache: self.status_cache.stats(),
            player_cache: self.enrichment.as_ref().map(|e| e.cache().stats()),
            console_permits_remaining: self
                .enrichment
                .as_ref()
                .map(|e| e.limiter().remaining(now)),
        }
    }

    /// Get server uptime in seconds.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.started_at)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Server orchestration.
pub struct Server {
    /// Shared application state
    state: Arc<AppState>,
    /// Server configuration
    config: ServerConfig,
}

impl Server {
    /// Create new server with configuration.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the shared state cannot be built.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let state = AppState::new(&config)?;

        tracing::info!(
            "Server initialized for {} at {}",
            config.server_name,
            config.server_address()
        );

        Ok(Self {
            state: Arc::new(state),
            config,
        })
    }

    /// Run the HTTP server until interrupted.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the shutdown signal cannot be installed.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting craftwatch");
        let http_bind = self.config.listen_addr();
        tracing::info!("HTTP server binding to: {}", http_bind);

        let http_state = self.state.clone();
        let http_server = tokio::spawn(async move {
            if let Err(e) = crate::http::start_server(http_bind, http_state).await {
                tracing::error!("HTTP server failed: {e}");
            }
        });

        // Wait for shutdown signal
        tokio::signal::ctrl_c().await.map_err(|e| {
            ServerError::Shutdown(format!("Failed to listen for shutdown signal: {e}"))
        })?;

        tracing::info!("Shutdown signal received, stopping server");
        http_server.abort();

        Ok(())
    }

    /// Get shared application state (for testing).
    #[cfg(test)]
    #[must_use]
    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}
