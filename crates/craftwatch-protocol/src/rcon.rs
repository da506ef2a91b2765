//! RCON console client
//!
//! Packets are little-endian: `i32 length | i32 request id | i32 type |
//! body | 0x00 | 0x00`, where the length covers everything after itself.

use crate::address::ServerAddress;
use crate::error::{ProtocolError, Result};
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

/// Largest packet body accepted in either direction
pub const MAX_BODY_LEN: usize = 4096;

/// id and type
const HEADER_LEN: usize = 4 + 4;

/// id, type and the two terminating nul bytes
const HEADER_AND_PADDING: usize = HEADER_LEN + 2;

pub const PACKET_RESPONSE: i32 = 0;
pub const PACKET_COMMAND: i32 = 2;
pub const PACKET_AUTH_RESPONSE: i32 = 2;
pub const PACKET_LOGIN: i32 = 3;

/// Request id the server answers with when authentication fails
const AUTH_FAILED_ID: i32 = -1;

/// One RCON packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RconPacket {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

impl RconPacket {
    pub fn new(id: i32, kind: i32, body: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }

    /// Serialize the packet, length prefix included.
    pub fn encode(&self) -> Result<BytesMut> {
        let body = self.body.as_bytes();
        if body.len() > MAX_BODY_LEN {
            return Err(ProtocolError::PacketTooLarge {
                size: body.len(),
                max: MAX_BODY_LEN,
            });
        }

        let len = body.len() + HEADER_AND_PADDING;
        let mut buf = BytesMut::with_capacity(len + 4);
        // Bounded by MAX_BODY_LEN above
        buf.put_i32_le(len as i32);
        buf.put_i32_le(self.id);
        buf.put_i32_le(self.kind);
        buf.put_slice(body);
        buf.put_u8(0);
        buf.put_u8(0);
        Ok(buf)
    }

    /// Decode the bytes that follow the length prefix.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() < HEADER_LEN {
            return Err(ProtocolError::Parse(format!(
                "RCON packet of {} bytes is shorter than its header",
                frame.len()
            )));
        }

        let id = i32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
        let kind = i32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]);
        // Body and padding terminators; some servers send only one
        let mut body = &frame[HEADER_LEN..];
        for _ in 0..2 {
            body = body.strip_suffix(&[0]).unwrap_or(body);
        }

        Ok(Self {
            id,
            kind,
            body: String::from_utf8_lossy(body).into_owned(),
        })
    }

    /// Read one packet from `reader`.
    pub async fn read_from<R: tokio::io::AsyncRead + Unpin>(reader: &mut R) -> Result<Self> {
        let len = reader.read_i32_le().await?;
        let len = usize::try_from(len)
            .map_err(|_| ProtocolError::Parse(format!("negative RCON packet length {len}")))?;
        if len > MAX_BODY_LEN + HEADER_AND_PADDING {
            return Err(ProtocolError::PacketTooLarge {
                size: len,
                max: MAX_BODY_LEN + HEADER_AND_PADDING,
            });
        }

        let mut frame = vec![0u8; len];
        reader.read_exact(&mut frame).await?;
        Self::decode(&frame)
    }
}

/// Connection settings for the RCON console.
#[derive(Clone)]
pub struct RconClient {
    address: ServerAddress,
    password: String,
    timeout: Duration,
}

impl fmt::Debug for RconClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RconClient")
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RconClient {
    pub fn new(address: ServerAddress, password: impl Into<String>) -> Self {
        Self {
            address,
            password: password.into(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Per-operation timeout, applied to login and to each command
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Open a connection and authenticate.
    pub async fn connect(&self) -> Result<RconSession> {
        tokio::time::timeout(self.timeout, self.connect_inner())
            .await
            .map_err(|_| ProtocolError::Timeout)?
    }

    async fn connect_inner(&self) -> Result<RconSession> {
        debug!("Opening RCON session to {}", self.address);
        let stream = TcpStream::connect((self.address.host(), self.address.port())).await?;
        stream.set_nodelay(true)?;

        let mut session = RconSession {
            stream,
            next_id: 0,
            timeout: self.timeout,
            abandoned: false,
        };
        session.login(&self.password).await?;
        Ok(session)
    }
}

/// An authenticated RCON connection
#[derive(Debug)]
pub struct RconSession {
    stream: TcpStream,
    next_id: i32,
    timeout: Duration,
    /// Set once a command times out; the stream may be mid-frame
    abandoned: bool,
}

impl RconSession {
    fn allocate_id(&mut self) -> i32 {
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.next_id
    }

    async fn send(&mut self, packet: &RconPacket) -> Result<()> {
        trace!("RCON send id={} type={}", packet.id, packet.kind);
        self.stream.write_all(&packet.encode()?).await?;
        Ok(())
    }

    async fn login(&mut self, password: &str) -> Result<()> {
        let id = self.allocate_id();
        self.send(&RconPacket::new(id, PACKET_LOGIN, password)).await?;

        loop {
            let reply = RconPacket::read_from(&mut self.stream).await?;
            // Some servers send an empty response packet before the auth result
            if reply.kind == PACKET_RESPONSE {
                continue;
            }
            if reply.kind != PACKET_AUTH_RESPONSE {
                return Err(ProtocolError::Parse(format!(
                    "Unexpected packet type {} during login",
                    reply.kind
                )));
            }
            if reply.id == AUTH_FAILED_ID {
                warn!("RCON authentication rejected");
                return Err(ProtocolError::AuthenticationFailed);
            }
            if reply.id != id {
                return Err(ProtocolError::Parse(format!(
                    "Login answered with id {}, expected {id}",
                    reply.id
                )));
            }
            return Ok(());
        }
    }

    /// Run one console command and return its output.
    ///
    /// A command that outlives the session timeout fails with
    /// [`ProtocolError::Timeout`]. The read may have stopped inside a
    /// frame, so every later command on this session fails with
    /// [`ProtocolError::SessionAbandoned`] without touching the stream.
    pub async fn command(&mut self, command: &str) -> Result<String> {
        if self.abandoned {
            return Err(ProtocolError::SessionAbandoned);
        }

        let timeout = self.timeout;
        let result = tokio::time::timeout(timeout, self.command_inner(command)).await;
        result.unwrap_or_else(|_| {
            warn!("RCON command {command:?} timed out, abandoning session");
            self.abandoned = true;
            Err(ProtocolError::Timeout)
        })
    }

    /// Whether an earlier command timed out.
    pub const fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    async fn command_inner(&mut self, command: &str) -> Result<String> {
        let id = self.allocate_id();
        self.send(&RconPacket::new(id, PACKET_COMMAND, command)).await?;

        loop {
            let reply = RconPacket::read_from(&mut self.stream).await?;
            if reply.id == id && reply.kind == PACKET_RESPONSE {
                trace!("RCON reply to {command:?}: {} bytes", reply.body.len());
                return Ok(reply.body);
            }
            trace!("Skipping stale RCON packet id={}", reply.id);
        }
    }
}
