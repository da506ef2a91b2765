//! JSON response bodies.
//!
//! [`ResponseAssembler`] maps a status snapshot and per-player enrichment
//! into the public payloads. It performs no I/O and holds no mutable state.
//!
//! # Example
//!
//! ```
//! use craftwatch_api::ResponseAssembler;
//! use craftwatch_protocol::{ServerAddress, ServerStatus};
//!
//! let assembler = ResponseAssembler::new("Lobby", ServerAddress::new("127.0.0.1", 25565));
//! let status = ServerStatus::from_json(
//!     r#"{"version":{"name":"1.20.4","protocol":765},"players":{"max":20,"online":0}}"#,
//!     4.2,
//! )
//! .unwrap();
//!
//! let players = assembler.players(&status, Vec::new());
//! assert_eq!(players.players.names_string, "No players online");
//! ```

use crate::enrichment::EnrichmentResult;
use craftwatch_cache::CacheStats;
use craftwatch_protocol::{ServerAddress, ServerStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::iter;

pub mod player;

pub use player::{AvatarUrls, PlayerRecord, SkinUrls};

/// Shown in `names_string` when the player sample is empty
pub const NO_PLAYERS: &str = "No players online";

/// Body of `GET /server/status`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub online: bool,
    pub server_name: String,
    pub players_online: u32,
    pub max_players: u32,
    pub latency: f64,
    pub version: String,
}

/// Body of `GET /server/players`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayersResponse {
    pub success: bool,
    pub server_name: String,
    pub players: PlayerList,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerList {
    pub online: u32,
    pub max: u32,
    /// Size of the sample, which may be below `online`
    pub count: usize,
    pub list: Vec<PlayerRecord>,
    pub names_only: Vec<String>,
    pub names_string: String,
}

/// Body of `GET /server/ping`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingResponse {
    pub success: bool,
    pub server_name: String,
    pub latency: f64,
    pub message: String,
}

/// Body of `GET /server/info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoResponse {
    pub success: bool,
    pub server: ServerInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub ip: String,
    pub port: u16,
    pub version: String,
    pub protocol: i32,
    pub description: String,
    pub latency: f64,
    pub favicon: Option<String>,
    pub players: InfoPlayers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoPlayers {
    pub online: u32,
    pub max: u32,
    pub list: Vec<PlayerRecord>,
}

/// Body of `GET /`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeResponse {
    pub message: String,
    pub server: ServerSummary,
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub features: Features,
    pub stats: ServiceStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSummary {
    pub name: String,
    pub ip: String,
    pub port: u16,
}

/// Human-readable description of the caching and enrichment setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Features {
    pub cache: String,
    pub rate_limit: String,
    pub essentials: String,
}

/// Runtime counters reported by `GET /`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStats {
    pub uptime_seconds: u64,
    pub status_cache: CacheStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_cache: Option<CacheStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_permits_remaining: Option<u32>,
}

/// Builds response bodies for one monitored server.
#[derive(Debug, Clone)]
pub struct ResponseAssembler {
    server_name: String,
    address: ServerAddress,
}

impl ResponseAssembler {
    pub fn new(server_name: impl Into<String>, address: ServerAddress) -> Self {
        Self {
            server_name: server_name.into(),
            address,
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub const fn address(&self) -> &ServerAddress {
        &self.address
    }

    pub fn status(&self, status: &ServerStatus) -> StatusResponse {
        StatusResponse {
            success: true,
            online: true,
            server_name: self.server_name.clone(),
            players_online: status.players.online,
            max_players: status.players.max,
            latency: status.latency_ms,
            version: status.version.name.clone(),
        }
    }

    /// `essentials[i]` belongs to the i-th sampled player; missing trailing
    /// entries mean no enrichment.
    pub fn players(
        &self,
        status: &ServerStatus,
        essentials: Vec<Option<EnrichmentResult>>,
    ) -> PlayersResponse {
        let names_only: Vec<String> = status
            .player_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let names_string = if names_only.is_empty() {
            NO_PLAYERS.to_string()
        } else {
            names_only.join(",")
        };

        PlayersResponse {
            success: true,
            server_name: self.server_name.clone(),
            players: PlayerList {
                online: status.players.online,
                max: status.players.max,
                count: names_only.len(),
                list: Self::player_records(status, essentials),
                names_only,
                names_string,
            },
        }
    }

    pub fn info(
        &self,
        status: &ServerStatus,
        essentials: Vec<Option<EnrichmentResult>>,
    ) -> InfoResponse {
        InfoResponse {
            success: true,
            server: ServerInfo {
                name: self.server_name.clone(),
                ip: self.address.host().to_string(),
                port: self.address.port(),
                version: status.version.name.clone(),
                protocol: status.version.protocol,
                description: status.description.clone(),
                latency: status.latency_ms,
                favicon: status.favicon.clone(),
                players: InfoPlayers {
                    online: status.players.online,
                    max: status.players.max,
                    list: Self::player_records(status, essentials),
                },
            },
        }
    }

    pub fn ping(&self, latency_ms: f64) -> PingResponse {
        PingResponse {
            success: true,
            server_name: self.server_name.clone(),
            latency: latency_ms,
            message: format!("{} responded in {latency_ms:.2}ms", self.server_name),
        }
    }

    pub fn home(&self, features: Features, stats: ServiceStats) -> HomeResponse {
        HomeResponse {
            message: format!("Status API for {}", self.server_name),
            server: ServerSummary {
                name: self.server_name.clone(),
                ip: self.address.host().to_string(),
                port: self.address.port(),
            },
            endpoints: BTreeMap::from([
                ("/server/info", "Full server information"),
                ("/server/status", "Basic server status"),
                ("/server/players", "Player list (detailed and names only)"),
                ("/server/ping", "Server latency"),
            ]),
            features,
            stats,
        }
    }

    fn player_records(
        status: &ServerStatus,
        essentials: Vec<Option<EnrichmentResult>>,
    ) -> Vec<PlayerRecord> {
        status
            .players
            .sample
            .iter()
            .zip(essentials.into_iter().chain(iter::repeat_with(|| None)))
            .map(|(sample, essentials)| PlayerRecord::new(sample, essentials))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn assembler() -> ResponseAssembler {
        ResponseAssembler::new("Lobby", ServerAddress::new("mc.example.net", 25615))
    }

    fn status_with(players: &[(&str, &str)]) -> ServerStatus {
        let sample: Vec<_> = players
            .iter()
            .map(|(name, id)| json!({"name": name, "id": id}))
            .collect();
        let doc = json!({
            "version": {"name": "Paper 1.20.4", "protocol": 765},
            "players": {"max": 50, "online": players.len(), "sample": sample},
            "description": {"text": "Welcome"},
            "favicon": "data:image/png;base64,AAAA"
        });
        ServerStatus::from_json(&doc.to_string(), 12.5).unwrap()
    }

    #[test]
    fn test_status_body() {
        let body = serde_json::to_value(assembler().status(&status_with(&[]))).unwrap();
        assert_eq!(
            body,
            json!({
                "success": true,
                "online": true,
                "server_name": "Lobby",
                "players_online": 0,
                "max_players": 50,
                "latency": 12.5,
                "version": "Paper 1.20.4"
            })
        );
    }

    #[test]
    fn test_players_body_joins_names() {
        let status = status_with(&[("Steve", "id-steve"), ("Alex", "id-alex")]);
        let essentials = vec![Some(EnrichmentResult::Success(BTreeMap::from([(
            "balance".to_string(),
            "$5".to_string(),
        )])))];

        let body = assembler().players(&status, essentials);
        assert_eq!(body.players.count, 2);
        assert_eq!(body.players.names_only, vec!["Steve", "Alex"]);
        assert_eq!(body.players.names_string, "Steve,Alex");
        assert!(body.players.list[0].essentials.is_some());
        // No enrichment supplied for the second player
        assert!(body.players.list[1].essentials.is_none());
    }

    #[test]
    fn test_players_body_empty() {
        let body = assembler().players(&status_with(&[]), Vec::new());
        assert_eq!(body.players.names_string, NO_PLAYERS);
        assert!(body.players.list.is_empty());
    }

    #[test]
    fn test_ping_message_has_two_decimals() {
        let body = assembler().ping(7.4567);
        assert_eq!(body.message, "Lobby responded in 7.46ms");
    }

    #[test]
    fn test_info_body() {
        let status = status_with(&[("Steve", "id-steve")]);
        let body = serde_json::to_value(assembler().info(&status, vec![None])).unwrap();

        assert_eq!(body["server"]["ip"], "mc.example.net");
        assert_eq!(body["server"]["port"], 25615);
        assert_eq!(body["server"]["protocol"], 765);
        assert_eq!(body["server"]["description"], "Welcome");
        assert_eq!(body["server"]["players"]["list"][0]["name"], "Steve");
        assert!(body["server"]["players"]["list"][0].get("essentials").is_none());
    }
}
