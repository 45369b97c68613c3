//! Statistics for the signaling server

use std::time::Duration;

/// Server-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerStats {
    /// Total connections ever
    pub total_connections: u64,
    /// Current live connections (the "online" counter)
    pub active_connections: u64,
    /// Rooms in the registry
    pub rooms: usize,
    /// Rooms waiting for a partner
    pub waiting_rooms: usize,
    /// Rooms with both slots filled
    pub paired_rooms: usize,
    /// SDP and ICE payloads forwarded to a counterpart
    pub signals_relayed: u64,
    /// SDP and ICE payloads dropped for lack of a counterpart
    pub signals_dropped: u64,
    /// Chat messages received
    pub chat_messages: u64,
    /// Deliveries lost to closed or full outbound queues
    pub deliveries_dropped: u64,
    /// Uptime
    pub uptime: Duration,
}

impl ServerStats {
    /// Create an empty stats snapshot
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_stats_new() {
        let stats = ServerStats::new();
        assert_eq!(stats.total_connections, 0);
        assert_eq!(stats.active_connections, 0);
        assert_eq!(stats.rooms, 0);
        assert_eq!(stats.signals_relayed, 0);
        assert_eq!(stats.uptime, Duration::ZERO);
    }
}
