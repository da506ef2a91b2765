//! Server list ping client
//!
//! Each call opens a fresh TCP connection, sends the handshake into the
//! status state and performs one exchange. The whole exchange, connect
//! included, is bounded by the client timeout.

use crate::address::ServerAddress;
use crate::codec::{encode_frame, get_string, put_string, put_varint, read_frame};
use crate::error::{ProtocolError, Result};
use crate::status::ServerStatus;
use bytes::{BufMut, BytesMut};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// Protocol version announced in the handshake. Servers answer status
/// requests regardless of the value.
const HANDSHAKE_PROTOCOL_VERSION: i32 = 47;

const HANDSHAKE_PACKET: i32 = 0x00;
const STATUS_REQUEST_PACKET: i32 = 0x00;
const STATUS_RESPONSE_PACKET: i32 = 0x00;
const PING_PACKET: i32 = 0x01;
const PONG_PACKET: i32 = 0x01;
const NEXT_STATE_STATUS: i32 = 1;

/// Server list ping client
#[derive(Debug, Clone)]
pub struct QueryClient {
    address: ServerAddress,
    timeout: Duration,
}

impl QueryClient {
    /// Create a client with a 5 second timeout
    pub fn new(address: ServerAddress) -> Self {
        Self {
            address,
            timeout: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    /// Fetch the server status document.
    pub async fn status(&self) -> Result<ServerStatus> {
        tokio::time::timeout(self.timeout, self.status_exchange())
            .await
            .map_err(|_| ProtocolError::Timeout)?
    }

    /// Measure the ping/pong round trip in milliseconds.
    pub async fn ping(&self) -> Result<f64> {
        tokio::time::timeout(self.timeout, self.ping_exchange())
            .await
            .map_err(|_| ProtocolError::Timeout)?
    }

    async fn status_exchange(&self) -> Result<ServerStatus> {
        let mut stream = self.connect_and_handshake().await?;

        let started = Instant::now();
        stream
            .write_all(&encode_frame(STATUS_REQUEST_PACKET, &[])?)
            .await?;

        let (packet_id, payload) = read_frame(&mut stream).await?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        if packet_id != STATUS_RESPONSE_PACKET {
            return Err(ProtocolError::Parse(format!(
                "Expected status response, got packet 0x{packet_id:02x}"
            )));
        }

        let json = get_string(&payload)?;
        trace!("Status response: {} bytes", json.len());
        ServerStatus::from_json(&json, latency_ms)
    }

    async fn ping_exchange(&self) -> Result<f64> {
        let mut stream = self.connect_and_handshake().await?;

        let token = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        let mut payload = BytesMut::with_capacity(8);
        payload.put_i64(token);

        let started = Instant::now();
        stream.write_all(&encode_frame(PING_PACKET, &payload)?).await?;

        let (packet_id, payload) = read_frame(&mut stream).await?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        if packet_id != PONG_PACKET {
            return Err(ProtocolError::Parse(format!(
                "Expected pong, got packet 0x{packet_id:02x}"
            )));
        }
        let echoed: [u8; 8] = payload
            .get(..8)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| ProtocolError::Parse("pong payload shorter than 8 bytes".to_string()))?;
        if i64::from_be_bytes(echoed) != token {
            return Err(ProtocolError::Parse(
                "pong does not echo the ping token".to_string(),
            ));
        }

        debug!("Ping to {} took {latency_ms:.2}ms", self.address);
        Ok(latency_ms)
    }

    async fn connect_and_handshake(&self) -> Result<TcpStream> {
        trace!("Connecting to {}", self.address);
        let mut stream =
            TcpStream::connect((self.address.host(), self.address.port())).await?;
        stream.set_nodelay(true)?;

        let mut payload = BytesMut::new();
        put_varint(&mut payload, HANDSHAKE_PROTOCOL_VERSION);
        put_string(&mut payload, self.address.host())?;
        payload.put_u16(self.address.port());
        put_varint(&mut payload, NEXT_STATE_STATUS);

        stream
            .write_all(&encode_frame(HANDSHAKE_PACKET, &payload)?)
            .await?;
        Ok(stream)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::codec::{get_varint, read_frame};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    const STATUS_JSON: &str = r#"{"version":{"name":"1.20.4","protocol":765},"players":{"max":20,"online":1,"sample":[{"name":"Steve","id":"8667ba71-b85a-4004-af54-457a9734eed7"}]},"description":"hello"}"#;

    /// Minimal status-state server answering one status request and one ping.
    async fn spawn_mock_server() -> ServerAddress {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let (id, handshake) = read_frame(&mut socket).await.unwrap();
                    assert_eq!(id, HANDSHAKE_PACKET);
                    let (version, _) = get_varint(&handshake).unwrap();
                    assert_eq!(version, HANDSHAKE_PROTOCOL_VERSION);
                    assert_eq!(handshake.last(), Some(&1));

                    while let Ok((id, payload)) = read_frame(&mut socket).await {
                        let reply = if id == STATUS_REQUEST_PACKET {
                            let mut body = BytesMut::new();
                            put_string(&mut body, STATUS_JSON).unwrap();
                            encode_frame(STATUS_RESPONSE_PACKET, &body).unwrap()
                        } else {
                            encode_frame(PONG_PACKET, &payload).unwrap()
                        };
                        socket.write_all(&reply).await.unwrap();
                    }
                });
            }
        });

        ServerAddress::new("127.0.0.1", addr.port())
    }

    #[tokio::test]
    async fn test_status_against_mock_server() {
        let address = spawn_mock_server().await;
        let client = QueryClient::new(address);

        let status = client.status().await.expect("status should succeed");
        assert_eq!(status.version.name, "1.20.4");
        assert_eq!(status.players.online, 1);
        assert_eq!(status.player_names(), vec!["Steve"]);
        assert!(status.latency_ms >= 0.0);
    }

    #[tokio::test]
    async fn test_ping_against_mock_server() {
        let address = spawn_mock_server().await;
        let latency = QueryClient::new(address).ping().await.unwrap();
        assert!(latency >= 0.0);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut sink = Vec::new();
            let _ = socket.read_to_end(&mut sink).await;
        });

        let client = QueryClient::new(ServerAddress::new("127.0.0.1", port))
            .with_timeout(Duration::from_millis(200));
        let err = client.status().await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = QueryClient::new(ServerAddress::new("127.0.0.1", port))
            .status()
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Network(_)));
        assert!(!err.is_timeout());
    }
}
