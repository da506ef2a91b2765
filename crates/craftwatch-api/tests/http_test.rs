//! Integration tests for the HTTP endpoints.
//!
//! These tests start a real HTTP server backed by in-process fake sources
//! and make actual requests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use async_trait::async_trait;
use axum::http::StatusCode;
use craftwatch_api::{AppState, Enricher, EnrichmentResult, ProfileEnricher, ServerConfig};
use craftwatch_protocol::{ProfileClient, ProtocolError, ServerStatus, StatusSource};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

const STATUS_JSON: &str = r#"{
    "version": {"name": "Paper 1.20.4", "protocol": 765},
    "players": {
        "max": 20,
        "online": 2,
        "sample": [
            {"name": "Steve", "id": "8667ba71-b85a-4004-af54-457a9734eed7"},
            {"name": "Alex", "id": "ec561538-f3fd-461d-aff5-086b22154bce"}
        ]
    },
    "description": {"text": "A test server"}
}"#;

enum Behaviour {
    Online,
    Refused,
    Hang,
}

/// Game server double counting status queries
struct FakeServer {
    behaviour: Behaviour,
    status_calls: AtomicU32,
}

impl FakeServer {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            status_calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl StatusSource for FakeServer {
    async fn status(&self) -> craftwatch_protocol::Result<ServerStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Online => ServerStatus::from_json(STATUS_JSON, 12.34),
            Behaviour::Refused => Err(ProtocolError::Network(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(ProtocolError::Timeout)
            }
        }
    }

    async fn ping(&self) -> craftwatch_protocol::Result<f64> {
        match self.behaviour {
            Behaviour::Online => Ok(7.4567),
            Behaviour::Refused => Err(ProtocolError::Network(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            Behaviour::Hang => Err(ProtocolError::Timeout),
        }
    }
}

/// Enricher answering with a fixed balance, counting calls
#[derive(Default)]
struct FakeEnricher {
    calls: AtomicU32,
}

#[async_trait]
impl Enricher for FakeEnricher {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch(&self, player: &str) -> EnrichmentResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        EnrichmentResult::Success(BTreeMap::from([(
            "balance".to_string(),
            format!("{player}: $100"),
        )]))
    }
}

/// Enricher slower than the whole request deadline
struct StalledEnricher {
    calls: AtomicU32,
}

#[async_trait]
impl Enricher for StalledEnricher {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn fetch(&self, _player: &str) -> EnrichmentResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        EnrichmentResult::Unavailable("too late".to_string())
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        http_bind: "127.0.0.1:0".parse().expect("Failed to parse HTTP bind address"),
        server_name: "TestCraft".to_string(),
        server_host: "mc.test".to_string(),
        server_port: 25615,
        request_timeout_secs: 1,
        ..ServerConfig::default()
    }
}

/// Start test HTTP server on random port.
async fn start_test_server(state: AppState) -> (SocketAddr, Arc<AppState>) {
    // Install ring crypto provider for reqwest (idempotent)
    let _ = rustls::crypto::ring::default_provider().install_default();

    let state = Arc::new(state);
    let app = craftwatch_api::http::create_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind HTTP listener");
    let addr = listener
        .local_addr()
        .expect("Failed to get listener address");

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("HTTP server failed to run");
    });

    (addr, state)
}

async fn get_json(addr: SocketAddr, path: &str) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .get(format!("http://{addr}{path}"))
        .send()
        .await
        .expect("Failed to send GET request to test server");
    let status = response.status();
    let body = response
        .text()
        .await
        .expect("Failed to read response body as text");
    (status, serde_json::from_str(&body).expect("Body should be JSON"))
}

#[tokio::test]
async fn test_status_endpoint_is_cached() {
    let server = FakeServer::new(Behaviour::Online);
    let state = AppState::with_sources(&test_config(), server.clone(), None).unwrap();
    let (addr, _state) = start_test_server(state).await;

    let (status, body) = get_json(addr, "/server/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "online": true,
            "server_name": "TestCraft",
            "players_online": 2,
            "max_players": 20,
            "latency": 12.34,
            "version": "Paper 1.20.4"
        })
    );

    let (status, _) = get_json(addr, "/server/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server.status_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_players_endpoint_with_enrichment() {
    let enricher = Arc::new(FakeEnricher::default());
    let state = AppState::with_sources(
        &test_config(),
        FakeServer::new(Behaviour::Online),
        Some(enricher.clone()),
    )
    .unwrap();
    let (addr, _state) = start_test_server(state).await;

    let (status, body) = get_json(addr, "/server/players").await;
    assert_eq!(status, StatusCode::OK);

    let players = &body["players"];
    assert_eq!(players["count"], 2);
    assert_eq!(players["names_only"], json!(["Steve", "Alex"]));
    assert_eq!(players["names_string"], "Steve,Alex");
    assert_eq!(
        players["list"][0]["essentials"],
        json!({"balance": "Steve: $100"})
    );
    assert_eq!(
        players["list"][1]["avatar"]["small"],
        "https://crafatar.com/avatars/ec561538-f3fd-461d-aff5-086b22154bce?size=32"
    );

    // Second request answered from the player cache
    get_json(addr, "/server/players").await;
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_players_endpoint_degrades_when_rate_limited() {
    let config = ServerConfig {
        rcon_limit: 1,
        ..test_config()
    };
    let enricher = Arc::new(FakeEnricher::default());
    let state = AppState::with_sources(
        &config,
        FakeServer::new(Behaviour::Online),
        Some(enricher.clone()),
    )
    .unwrap();
    let (addr, _state) = start_test_server(state).await;

    let (status, body) = get_json(addr, "/server/players").await;
    assert_eq!(status, StatusCode::OK);

    let essentials: Vec<&Value> = body["players"]["list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|player| &player["essentials"])
        .collect();
    let limited = essentials
        .iter()
        .filter(|e| **e == &json!({"error": "rate limit exceeded"}))
        .count();
    assert_eq!(limited, 1);
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_slow_enrichment_does_not_fail_players() {
    let enricher = Arc::new(StalledEnricher {
        calls: AtomicU32::new(0),
    });
    let state = AppState::with_sources(
        &test_config(),
        FakeServer::new(Behaviour::Online),
        Some(enricher.clone()),
    )
    .unwrap();
    let (addr, state) = start_test_server(state).await;

    for _ in 0..3 {
        let (status, body) = get_json(addr, "/server/players").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["players"]["count"], 2);
        for player in body["players"]["list"].as_array().unwrap() {
            assert_eq!(player["essentials"], json!({"error": "timeout"}));
        }
    }

    // One permit per player; later requests are answered from cache
    let enrichment = state.enrichment().unwrap();
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 2);
    assert_eq!(enrichment.limiter().remaining(Instant::now()), 8);
    assert_eq!(enrichment.cache().len(), 2);
}

#[tokio::test]
async fn test_query_only_mode_omits_essentials() {
    let state = AppState::with_sources(&test_config(), FakeServer::new(Behaviour::Online), None)
        .unwrap();
    let (addr, _state) = start_test_server(state).await;

    let (_, body) = get_json(addr, "/server/info").await;
    assert_eq!(body["server"]["ip"], "mc.test");
    assert_eq!(body["server"]["port"], 25615);
    assert_eq!(body["server"]["description"], "A test server");
    assert!(body["server"]["players"]["list"][0].get("essentials").is_none());
}

#[tokio::test]
async fn test_ping_endpoint() {
    let server = FakeServer::new(Behaviour::Online);
    let state = AppState::with_sources(&test_config(), server.clone(), None).unwrap();
    let (addr, _state) = start_test_server(state).await;

    let (status, body) = get_json(addr, "/server/ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "TestCraft responded in 7.46ms");
    // Ping never touches the status cache
    assert_eq!(server.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_path_returns_404_envelope() {
    let state = AppState::with_sources(&test_config(), FakeServer::new(Behaviour::Online), None)
        .unwrap();
    let (addr, _state) = start_test_server(state).await;

    let (status, body) = get_json(addr, "/server/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": "Endpoint not found",
            "message": "Check the URL and the endpoints listed at '/'",
            "server": "TestCraft"
        })
    );
}

#[tokio::test]
async fn test_unreachable_server_returns_500() {
    let state = AppState::with_sources(&test_config(), FakeServer::new(Behaviour::Refused), None)
        .unwrap();
    let (addr, _state) = start_test_server(state).await;

    let (status, body) = get_json(addr, "/server/status").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Error connecting to TestCraft");
    assert_eq!(body["server"], "TestCraft");
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_hanging_server_returns_504() {
    let state = AppState::with_sources(&test_config(), FakeServer::new(Behaviour::Hang), None)
        .unwrap();
    let (addr, _state) = start_test_server(state).await;

    let (status, body) = get_json(addr, "/server/players").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "Request timed out after 1s");
    assert_eq!(body["message"], "TestCraft did not respond in time");
}

#[tokio::test]
async fn test_home_reports_stats() {
    let state = AppState::with_sources(
        &test_config(),
        FakeServer::new(Behaviour::Online),
        Some(Arc::new(FakeEnricher::default())),
    )
    .unwrap();
    let (addr, _state) = start_test_server(state).await;

    get_json(addr, "/server/status").await;
    get_json(addr, "/server/status").await;

    let (status, body) = get_json(addr, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["server"]["name"], "TestCraft");
    assert_eq!(body["features"]["essentials"], "enabled (fake)");
    assert_eq!(body["stats"]["status_cache"]["hit_count"], 1);
    assert_eq!(body["stats"]["status_cache"]["miss_count"], 1);
    assert_eq!(body["stats"]["console_permits_remaining"], 10);
    assert!(body["endpoints"].get("/server/ping").is_some());
}

#[tokio::test]
async fn test_cors_headers_present() {
    let state = AppState::with_sources(&test_config(), FakeServer::new(Behaviour::Online), None)
        .unwrap();
    let (addr, _state) = start_test_server(state).await;

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/server/status"))
        .header("Origin", "https://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_profile_enrichment_against_mock_service() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/profiles/minecraft/Steve"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"id":"8667ba71b85a4004af54457a9734eed7","name":"Steve"}"#),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/profiles/minecraft/Alex"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let profiles = ProfileClient::new(&mock_server.uri(), Duration::from_secs(5)).unwrap();
    let enricher = ProfileEnricher::new(Arc::new(profiles), Duration::from_secs(5));
    let state = AppState::with_sources(
        &test_config(),
        FakeServer::new(Behaviour::Online),
        Some(Arc::new(enricher)),
    )
    .unwrap();
    let (addr, _state) = start_test_server(state).await;

    let (status, body) = get_json(addr, "/server/players").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["players"]["list"][0]["essentials"],
        json!({"name": "Steve", "uuid": "8667ba71b85a4004af54457a9734eed7"})
    );
    assert_eq!(
        body["players"]["list"][1]["essentials"],
        json!({"error": "Profile not found: Alex"})
    );
}
