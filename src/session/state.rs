//! Connection state machine
//!
//! Tracks a connection from accept to disconnect:
//!
//! ```text
//! Unpaired ──start──► Waiting ──partner joins──► Paired
//!                        ▲                         │
//!                        └──── partner leaves ◄────┘
//!
//! any phase ──disconnect──► Gone
//! ```

use std::net::SocketAddr;
use std::time::Instant;

use crate::registry::ConnectionId;

/// Matchmaking phase of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Connected, has not asked to be paired
    Unpaired,
    /// Alone in a room, waiting for a partner
    Waiting,
    /// Sharing a room with a partner
    Paired,
    /// Disconnect processed
    Gone,
}

/// Per-connection bookkeeping kept by the transport
#[derive(Debug)]
pub struct SessionState {
    /// Connection identifier handed to the relay
    pub id: ConnectionId,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    pub phase: ConnectionPhase,

    /// Connection start time
    pub connected_at: Instant,

    /// Text frames received
    pub frames_received: u64,

    /// Frames rejected as malformed or oversized
    pub frames_rejected: u64,
}

impl SessionState {
    /// Create a new session state
    pub fn new(id: ConnectionId, peer_addr: SocketAddr) -> Self {
        Self {
            id,
            peer_addr,
            phase: ConnectionPhase::Unpaired,
            connected_at: Instant::now(),
            frames_received: 0,
            frames_rejected: 0,
        }
    }

    /// Record the phase reported by the relay after an event
    ///
    /// A session that is already gone stays gone.
    pub fn observe(&mut self, phase: ConnectionPhase) {
        if self.phase != ConnectionPhase::Gone {
            self.phase = phase;
        }
    }

    /// Mark the disconnect as processed
    pub fn close(&mut self) {
        self.phase = ConnectionPhase::Gone;
    }

    /// Get session duration
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
