//! Enrichment from the public profile service

use super::{Enricher, EnrichmentResult};
use async_trait::async_trait;
use craftwatch_protocol::ProfileSource;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub struct ProfileEnricher {
    profiles: Arc<dyn ProfileSource>,
    timeout: Duration,
}

impl ProfileEnricher {
    pub fn new(profiles: Arc<dyn ProfileSource>, timeout: Duration) -> Self {
        Self { profiles, timeout }
    }
}

#[async_trait]
impl Enricher for ProfileEnricher {
    fn name(&self) -> &'static str {
        "profile"
    }

    async fn fetch(&self, player: &str) -> EnrichmentResult {
        match tokio::time::timeout(self.timeout, self.profiles.lookup(player)).await {
            Ok(Ok(profile)) => EnrichmentResult::Success(BTreeMap::from([
                ("uuid".to_string(), profile.id),
                ("name".to_string(), profile.name),
            ])),
            Ok(Err(e)) => {
                tracing::warn!(player, "Profile lookup failed: {e}");
                EnrichmentResult::Unavailable(e.to_string())
            }
            Err(_) => {
                tracing::warn!(player, "Profile lookup timed out");
                EnrichmentResult::Unavailable(format!(
                    "profile lookup timed out after {:?}",
                    self.timeout
                ))
            }
        }
    }
}
