//! WebRTC signaling relay
//!
//! `pairlink` pairs anonymous WebSocket connections into two-party rooms and
//! forwards SDP offers/answers, ICE candidates and chat text between the two
//! members of each room. Media never passes through the server.
//!
//! # Modules
//!
//! - [`registry`]: rooms, slots and the indices that keep matchmaking cheap
//! - [`relay`]: the matchmaking state machine, free of I/O
//! - [`protocol`]: JSON wire events
//! - [`server`]: WebSocket listener feeding the relay
//!
//! # Example
//!
//! ```no_run
//! use pairlink::{ServerConfig, SignalServer};
//!
//! # async fn run() -> pairlink::Result<()> {
//! let server = SignalServer::new(ServerConfig::from_env());
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await
//! # }
//! ```

pub mod error;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use registry::{ConnectionId, RegistryError, Role, Room, RoomId, RoomRegistry};
pub use relay::{Delivery, Matchmaker};
pub use server::{ServerConfig, SignalServer};
pub use stats::ServerStats;
