//! # craftwatch-protocol
//!
//! Clients for the three remote endpoints a Minecraft status service talks to:
//!
//! - **Server list ping** ([`QueryClient`]): the unauthenticated status
//!   exchange every Minecraft server answers on its game port. Yields the
//!   version, player counts, player sample and message of the day, plus a
//!   ping/pong round trip measurement.
//! - **RCON** ([`RconClient`]): the authenticated administrative console,
//!   used to run per-player commands such as `bal` or `playtime`.
//! - **Profile lookup** ([`ProfileClient`]): the public account directory,
//!   resolving a player name to its UUID and canonical spelling.
//!
//! Each client enforces its own timeout and reports expiry as
//! [`ProtocolError::Timeout`]. The [`source`] traits abstract the clients
//! so callers can substitute fakes.
//!
//! ## Example
//!
//! ```rust,no_run
//! use craftwatch_protocol::{QueryClient, ServerAddress, DEFAULT_QUERY_PORT};
//! use std::time::Duration;
//!
//! # async fn example() -> craftwatch_protocol::Result<()> {
//! let address = ServerAddress::parse("play.example.net", DEFAULT_QUERY_PORT)?;
//! let client = QueryClient::new(address).with_timeout(Duration::from_secs(3));
//!
//! let status = client.status().await?;
//! println!(
//!     "{} players online: {}",
//!     status.players.online,
//!     status.player_names().join(", ")
//! );
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod codec;
pub mod error;
pub mod profile;
pub mod query;
pub mod rcon;
pub mod source;
pub mod status;

pub use address::{DEFAULT_QUERY_PORT, DEFAULT_RCON_PORT, ServerAddress};
pub use error::{ProtocolError, Result};
pub use profile::{DEFAULT_PROFILE_API, Profile, ProfileClient};
pub use query::QueryClient;
pub use rcon::{RconClient, RconPacket, RconSession};
pub use source::{ConsoleSource, ProfileSource, StatusSource};
pub use status::{PlayerSample, PlayersInfo, ServerStatus, VersionInfo};
