//! Server status snapshot returned by the server list ping

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status of the monitored server at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerStatus {
    pub version: VersionInfo,
    pub players: PlayersInfo,
    /// Message of the day flattened to plain text
    pub description: String,
    /// `data:image/png;base64,...` icon, if the server has one
    pub favicon: Option<String>,
    /// Round trip of the status exchange in milliseconds
    pub latency_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayersInfo {
    pub online: u32,
    pub max: u32,
    /// Partial list of online players; servers may omit or truncate it
    #[serde(default)]
    pub sample: Vec<PlayerSample>,
}

/// One entry of the online player sample
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerSample {
    pub name: String,
    /// Player UUID as reported by the server
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    version: VersionInfo,
    players: PlayersInfo,
    #[serde(default)]
    description: Value,
    #[serde(default)]
    favicon: Option<String>,
}

impl ServerStatus {
    /// Parse the JSON document carried by a status response packet
    pub fn from_json(json: &str, latency_ms: f64) -> Result<Self> {
        let raw: RawStatus = serde_json::from_str(json)?;
        Ok(Self {
            version: raw.version,
            players: raw.players,
            description: flatten_description(&raw.description),
            favicon: raw.favicon,
            latency_ms,
        })
    }

    /// Names of the sampled players, in server order
    pub fn player_names(&self) -> Vec<&str> {
        self.players
            .sample
            .iter()
            .map(|player| player.name.as_str())
            .collect()
    }
}

/// Reduce a description (plain string or chat component) to its text.
fn flatten_description(value: &Value) -> String {
    let mut text = String::new();
    append_component(value, &mut text);
    text
}

fn append_component(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Array(parts) => {
            for part in parts {
                append_component(part, out);
            }
        }
        Value::Object(map) => {
            if let Some(text) = map.get("text") {
                append_component(text, out);
            }
            if let Some(extra) = map.get("extra") {
                append_component(extra, out);
            }
        }
        _ => {}
    }
}
