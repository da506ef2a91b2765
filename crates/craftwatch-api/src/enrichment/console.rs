//! Enrichment from the server console (balance, playtime, last seen)

use super::{Enricher, EnrichmentResult};
use async_trait::async_trait;
use craftwatch_protocol::ConsoleSource;
use std::sync::Arc;
use tracing::{debug, warn};

/// Output field and the console command producing it
const FIELDS: [(&str, &str); 3] = [
    ("balance", "bal"),
    ("playtime", "playtime"),
    ("last_seen", "seen"),
];

/// Runs one command per field over a single console session.
///
/// Each command is bounded by the console client's own timeout, so a slow
/// field fails on its own without holding back the others.
pub struct ConsoleEnricher {
    console: Arc<dyn ConsoleSource>,
}

impl ConsoleEnricher {
    pub fn new(console: Arc<dyn ConsoleSource>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl Enricher for ConsoleEnricher {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn fetch(&self, player: &str) -> EnrichmentResult {
        let commands: Vec<String> = FIELDS
            .iter()
            .map(|(_, command)| format!("{command} {player}"))
            .collect();

        let outcomes = match self.console.run_batch(&commands).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                warn!(player, "Console unavailable: {e}");
                return EnrichmentResult::Unavailable(format!("console unavailable: {e}"));
            }
        };

        debug!(player, "Console batch finished");
        EnrichmentResult::from_fields(FIELDS.iter().zip(outcomes).map(|((field, _), outcome)| {
            (
                (*field).to_string(),
                outcome.map(|reply| reply.trim().to_string()).map_err(|e| {
                    warn!(player, field = *field, "Console command failed: {e}");
                    e.to_string()
                }),
            )
        }))
    }
}
