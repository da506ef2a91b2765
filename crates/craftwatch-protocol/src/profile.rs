//! Player profile lookup over HTTPS

use crate::error::{ProtocolError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Public profile service
pub const DEFAULT_PROFILE_API: &str = "https://api.mojang.com";

/// Account identity returned by the profile service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// UUID without dashes
    pub id: String,
    /// Name with the account's canonical capitalisation
    pub name: String,
}

/// Install the ring provider for rustls. Safe to call repeatedly.
pub fn ensure_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Client for `GET {base}/users/profiles/minecraft/{name}`
#[derive(Debug, Clone)]
pub struct ProfileClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ProfileClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ProtocolError::InvalidEndpoint(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ProtocolError::InvalidEndpoint(base_url.to_string()));
        }

        ensure_crypto_provider();
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    fn profile_url(&self, name: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProtocolError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["users", "profiles", "minecraft", name]);
        Ok(url)
    }

    /// Look up the profile of `name`.
    pub async fn lookup(&self, name: &str) -> Result<Profile> {
        let url = self.profile_url(name)?;
        debug!("Profile request URL: {}", url);

        let response = self.client.get(url).timeout(self.timeout).send().await?;
        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await?;
                Ok(serde_json::from_slice(&body)?)
            }
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => {
                Err(ProtocolError::NotFound(name.to_string()))
            }
            status => Err(ProtocolError::HttpStatus(status)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_profile_url_joins_segments() {
        let client = ProfileClient::new("https://profiles.test/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.profile_url("Steve").unwrap().as_str(),
            "https://profiles.test/api/users/profiles/minecraft/Steve"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ProfileClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(ProfileClient::new("mailto:someone", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_lookup_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/profiles/minecraft/steve"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"id":"8667ba71b85a4004af54457a9734eed7","name":"Steve"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = ProfileClient::new(&mock_server.uri(), Duration::from_secs(5)).unwrap();
        let profile = client.lookup("steve").await.unwrap();
        assert_eq!(
            profile,
            Profile {
                id: "8667ba71b85a4004af54457a9734eed7".to_string(),
                name: "Steve".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/profiles/minecraft/nobody"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let client = ProfileClient::new(&mock_server.uri(), Duration::from_secs(5)).unwrap();
        let err = client.lookup("nobody").await.unwrap_err();
        assert!(matches!(err, ProtocolError::NotFound(name) if name == "nobody"));
    }

    #[tokio::test]
    async fn test_lookup_server_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = ProfileClient::new(&mock_server.uri(), Duration::from_secs(5)).unwrap();
        let err = client.lookup("Alex").await.unwrap_err();
        assert!(matches!(err, ProtocolError::HttpStatus(StatusCode::SERVICE_UNAVAILABLE)));
    }

    #[tokio::test]
    async fn test_lookup_slow_service_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let client = ProfileClient::new(&mock_server.uri(), Duration::from_millis(200)).unwrap();
        let err = client.lookup("Alex").await.unwrap_err();
        assert!(err.is_timeout());
    }
}
