//! Outbound deliveries computed by the relay

use crate::protocol::ServerEvent;
use crate::registry::ConnectionId;

/// An event addressed to one connection
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Recipient
    pub to: ConnectionId,
    /// Event to send
    pub event: ServerEvent,
}

impl Delivery {
    /// Address `event` to `to`
    pub fn new(to: ConnectionId, event: ServerEvent) -> Self {
        Self { to, event }
    }
}
