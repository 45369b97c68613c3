//! Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

/// Port used when neither the config nor `PORT` names one
pub const DEFAULT_PORT: u16 = 8000;

/// Frames this many times larger than `max_message_size` end the connection
/// instead of earning an error event
pub const HARD_LIMIT_FACTOR: usize = 4;

/// Environment variable read by [`ServerConfig::from_env`]
pub const PORT_ENV: &str = "PORT";

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// WebSocket handshake must complete within this time
    pub handshake_timeout: Duration,

    /// Per-connection outbound queue length; events beyond it are dropped
    pub outbound_queue: usize,

    /// Largest accepted text frame in bytes
    pub max_message_size: usize,

    /// Send the live connection count to everyone on connect and disconnect
    pub broadcast_online: bool,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_connections: 0, // Unlimited
            handshake_timeout: Duration::from_secs(10),
            outbound_queue: 64,
            max_message_size: 64 * 1024, // 64KB
            broadcast_online: true,
            tcp_nodelay: true, // Signaling is latency sensitive
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Default config, listening on the port named by `PORT` if it is set
    /// and valid
    pub fn from_env() -> Self {
        let config = Self::default();

        match std::env::var(PORT_ENV) {
            Ok(value) => match value.trim().parse::<u16>() {
                Ok(port) => config.port(port),
                Err(_) => {
                    tracing::warn!(value = %value, "Ignoring invalid PORT");
                    config
                }
            },
            Err(_) => config,
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Keep the bind IP, change the port
    pub fn port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set outbound queue length (at least 1)
    pub fn outbound_queue(mut self, len: usize) -> Self {
        self.outbound_queue = len.max(1);
        self
    }

    /// Set maximum text frame size
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Size at which tungstenite stops reading a message and fails the
    /// connection
    pub fn hard_message_limit(&self) -> usize {
        self.max_message_size.saturating_mul(HARD_LIMIT_FACTOR)
    }

    /// WebSocket settings applied at handshake
    pub fn websocket_config(&self) -> WebSocketConfig {
        let limit = self.hard_message_limit();
        WebSocketConfig {
            max_message_size: Some(limit),
            max_frame_size: Some(limit),
            ..Default::default()
        }
    }

    /// Stop broadcasting the online counter
    pub fn disable_online_broadcast(mut self) -> Self {
        self.broadcast_online = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.outbound_queue, 64);
        assert_eq!(config.max_message_size, 64 * 1024);
        assert!(config.broadcast_online);
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr, addr);
    }

    #[test]
    fn test_builder_port_keeps_ip() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = ServerConfig::with_addr(addr).port(9100);

        assert_eq!(config.bind_addr, "127.0.0.1:9100".parse().unwrap());
    }

    #[test]
    fn test_builder_outbound_queue_minimum() {
        let config = ServerConfig::default().outbound_queue(0);

        assert_eq!(config.outbound_queue, 1);
    }

    #[test]
    fn test_websocket_config_caps_messages() {
        let config = ServerConfig::default().max_message_size(1024);
        let ws = config.websocket_config();

        assert_eq!(config.hard_message_limit(), 4096);
        assert_eq!(ws.max_message_size, Some(4096));
        assert_eq!(ws.max_frame_size, Some(4096));
    }

    #[test]
    fn test_hard_limit_saturates() {
        let config = ServerConfig::default().max_message_size(usize::MAX);
        assert_eq!(config.hard_message_limit(), usize::MAX);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_connections(50)
            .handshake_timeout(Duration::from_secs(5))
            .outbound_queue(16)
            .max_message_size(1024)
            .disable_online_broadcast();

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.handshake_timeout, Duration::from_secs(5));
        assert_eq!(config.outbound_queue, 16);
        assert_eq!(config.max_message_size, 1024);
        assert!(!config.broadcast_online);
    }
}
