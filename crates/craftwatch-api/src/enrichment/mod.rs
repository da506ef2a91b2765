//! Per-player enrichment.
//!
//! An [`Enricher`] produces extra fields for one player (console balance,
//! playtime, profile UUID...). The [`EnrichmentOrchestrator`] puts the
//! player cache and the console rate limiter in front of it.

use async_trait::async_trait;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

mod console;
mod orchestrator;
mod profile;

pub use console::ConsoleEnricher;
pub use orchestrator::EnrichmentOrchestrator;
pub use profile::ProfileEnricher;

/// Marker written in place of a field whose lookup failed
pub const UNAVAILABLE: &str = "unavailable";

/// Reason given when the rate limiter denies a refresh and nothing is cached
pub const RATE_LIMITED: &str = "rate limit exceeded";

/// Reason given when enrichment outlives its share of the request deadline
pub const TIMED_OUT: &str = "timeout";

/// Value of one field in a partially failed enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Value(String),
    Unavailable,
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => serializer.serialize_str(value),
            Self::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

/// Outcome of enriching one player.
///
/// Serializes as a flat object of fields, or `{"error": reason}` when
/// nothing could be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentResult {
    /// Every field was fetched
    Success(BTreeMap<String, String>),
    /// Some fields failed; the others are kept
    PartialFailure(BTreeMap<String, FieldValue>),
    /// No field could be fetched
    Unavailable(String),
}

impl EnrichmentResult {
    /// Combine per-field outcomes.
    ///
    /// All fields succeeding gives `Success`, all failing gives
    /// `Unavailable` with the first failure, anything else `PartialFailure`.
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (String, Result<String, String>)>,
    {
        let mut values = BTreeMap::new();
        let mut first_error = None;
        let mut succeeded = 0usize;

        for (name, outcome) in fields {
            match outcome {
                Ok(value) => {
                    succeeded += 1;
                    values.insert(name, FieldValue::Value(value));
                }
                Err(reason) => {
                    first_error.get_or_insert(reason);
                    values.insert(name, FieldValue::Unavailable);
                }
            }
        }

        match first_error {
            None => Self::Success(
                values
                    .into_iter()
                    .filter_map(|(name, value)| match value {
                        FieldValue::Value(v) => Some((name, v)),
                        FieldValue::Unavailable => None,
                    })
                    .collect(),
            ),
            Some(reason) if succeeded == 0 => Self::Unavailable(reason),
            Some(_) => Self::PartialFailure(values),
        }
    }

    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Value of `field`, if it was fetched
    pub fn field(&self, field: &str) -> Option<&str> {
        match self {
            Self::Success(fields) => fields.get(field).map(String::as_str),
            Self::PartialFailure(fields) => match fields.get(field) {
                Some(FieldValue::Value(value)) => Some(value.as_str()),
                _ => None,
            },
            Self::Unavailable(_) => None,
        }
    }
}

impl Serialize for EnrichmentResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(fields) => fields.serialize(serializer),
            Self::PartialFailure(fields) => fields.serialize(serializer),
            Self::Unavailable(reason) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", reason)?;
                map.end()
            }
        }
    }
}

/// Source of per-player fields.
///
/// Implementations never fail: lookup failures are reported inside the
/// returned [`EnrichmentResult`].
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Short name used in logs and the service description
    fn name(&self) -> &'static str;

    /// Fetch every field for `player`.
    async fn fetch(&self, player: &str) -> EnrichmentResult;
}
