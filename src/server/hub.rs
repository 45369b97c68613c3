//! Shared connection table and relay
//!
//! The hub pairs the [`Matchmaker`] with the outbound queue of every live
//! connection. The server keeps it behind one mutex so that each inbound
//! event, including the fan-out of its deliveries, is processed as a single
//! step that no other event can interleave with.

use std::collections::HashMap;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::protocol::{ClientEvent, ServerEvent, Signal};
use crate::registry::ConnectionId;
use crate::relay::{Delivery, Matchmaker};
use crate::session::ConnectionPhase;
use crate::stats::ServerStats;

/// Running totals kept alongside the connection table
#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    total_connections: u64,
    signals_relayed: u64,
    signals_dropped: u64,
    chat_messages: u64,
    deliveries_dropped: u64,
}

/// Live connections plus the room state machine
pub(crate) struct Hub {
    matchmaker: Matchmaker,
    peers: HashMap<ConnectionId, mpsc::Sender<ServerEvent>>,
    broadcast_online: bool,
    counters: Counters,
}

impl Hub {
    pub(crate) fn new(broadcast_online: bool) -> Self {
        Self {
            matchmaker: Matchmaker::new(),
            peers: HashMap::new(),
            broadcast_online,
            counters: Counters::default(),
        }
    }

    /// Add a connection's outbound queue and announce the new online count
    pub(crate) fn register(&mut self, id: ConnectionId, tx: mpsc::Sender<ServerEvent>) {
        self.peers.insert(id, tx);
        self.counters.total_connections += 1;
        self.announce_online();
    }

    /// Drop a connection, release its seat and announce the new online count
    pub(crate) fn unregister(&mut self, id: &ConnectionId) {
        if self.peers.remove(id).is_none() {
            return;
        }

        if let Some(delivery) = self.matchmaker.disconnect(id) {
            self.deliver(delivery);
        }
        self.announce_online();
    }

    /// Apply one client event and send whatever it produces
    pub(crate) fn dispatch(&mut self, from: &ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::Start => match self.matchmaker.start(from) {
                Ok(outcome) => {
                    tracing::debug!(
                        connection = %from,
                        room = %outcome.room_id,
                        role = %outcome.role,
                        "Matchmaking complete"
                    );
                    for delivery in outcome.deliveries {
                        self.deliver(delivery);
                    }
                }
                Err(e) => {
                    tracing::debug!(connection = %from, error = %e, "Start rejected");
                    self.deliver(Delivery::new(from.clone(), ServerEvent::error(e.to_string())));
                }
            },
            ClientEvent::IceSend { candidate } => {
                self.relay_signal(from, Signal::IceCandidate(candidate));
            }
            ClientEvent::SdpSend { sdp } => {
                self.relay_signal(from, Signal::SessionDescription(sdp));
            }
            ClientEvent::SendMessage {
                message,
                sender_role,
                room_id,
            } => {
                self.counters.chat_messages += 1;
                for delivery in self
                    .matchmaker
                    .relay_chat(from, &message, sender_role, &room_id)
                {
                    self.deliver(delivery);
                }
            }
        }
    }

    fn relay_signal(&mut self, from: &ConnectionId, signal: Signal) {
        match self.matchmaker.relay_signal(from, signal) {
            Some(delivery) => {
                self.counters.signals_relayed += 1;
                self.deliver(delivery);
            }
            None => self.counters.signals_dropped += 1,
        }
    }

    /// Queue an event for one connection without waiting
    pub(crate) fn deliver(&mut self, delivery: Delivery) {
        let Some(tx) = self.peers.get(&delivery.to) else {
            tracing::debug!(connection = %delivery.to, "Recipient gone, delivery dropped");
            self.counters.deliveries_dropped += 1;
            return;
        };

        match tx.try_send(delivery.event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(connection = %delivery.to, "Outbound queue full, delivery dropped");
                self.counters.deliveries_dropped += 1;
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(connection = %delivery.to, "Outbound queue closed");
                self.counters.deliveries_dropped += 1;
            }
        }
    }

    fn announce_online(&mut self) {
        if !self.broadcast_online {
            return;
        }

        let online = self.peers.len();
        let recipients: Vec<ConnectionId> = self.peers.keys().cloned().collect();
        for id in recipients {
            self.deliver(Delivery::new(id, ServerEvent::Online(online)));
        }
    }

    /// Matchmaking phase of a live connection
    pub(crate) fn phase(&self, id: &ConnectionId) -> ConnectionPhase {
        self.matchmaker.phase(id)
    }

    /// Number of live connections
    pub(crate) fn online(&self) -> usize {
        self.peers.len()
    }

    /// Snapshot of server counters; uptime is filled in by the caller
    pub(crate) fn stats(&self) -> ServerStats {
        let rooms = self.matchmaker.registry().stats();
        ServerStats {
            total_connections: self.counters.total_connections,
            active_connections: self.peers.len() as u64,
            rooms: rooms.rooms,
            waiting_rooms: rooms.waiting,
            paired_rooms: rooms.paired,
            signals_relayed: self.counters.signals_relayed,
            signals_dropped: self.counters.signals_dropped,
            chat_messages: self.counters.chat_messages,
            deliveries_dropped: self.counters.deliveries_dropped,
            ..ServerStats::default()
        }
    }
}
