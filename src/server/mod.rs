//! WebSocket transport for the relay
//!
//! Accepts connections, assigns each a fresh [`ConnectionId`], decodes
//! client frames and delivers the relay's output back over the sockets.
//!
//! [`ConnectionId`]: crate::registry::ConnectionId

pub mod config;
pub(crate) mod connection;
pub(crate) mod hub;
pub mod listener;

pub use config::ServerConfig;
pub use listener::SignalServer;
