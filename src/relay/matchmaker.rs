//! Matchmaking and relay controller
//!
//! Turns connection events into registry transitions and computes who should
//! hear about them. The controller performs no I/O: every operation returns
//! the [`Delivery`] list for the transport to send.

use crate::protocol::{ServerEvent, Signal};
use crate::registry::{ConnectionId, RegistryError, Role, RoomId, RoomRegistry};
use crate::session::ConnectionPhase;

use super::delivery::Delivery;

/// Label attached to chat sent from the `p1` slot
pub const OWN_LABEL: &str = "You: ";

/// Label attached to chat sent from the `p2` slot
pub const STRANGER_LABEL: &str = "Stranger: ";

/// Result of a successful `start`
#[derive(Debug, Clone, PartialEq)]
pub struct StartOutcome {
    /// Slot the caller now holds
    pub role: Role,
    /// Room the caller now belongs to
    pub room_id: RoomId,
    /// Notifications to send, the caller's role acknowledgement first
    pub deliveries: Vec<Delivery>,
}

/// A connection's seat and who sits opposite it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterpart {
    /// Slot held by the connection
    pub role: Role,
    /// Room the connection is in
    pub room_id: RoomId,
    /// Occupant of the opposite slot, if any
    pub peer: Option<ConnectionId>,
}

/// Pairs connections into rooms and routes their messages
#[derive(Debug, Default)]
pub struct Matchmaker {
    registry: RoomRegistry,
}

impl Matchmaker {
    /// Create a controller with an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a reference to the room registry
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Pair `connection` with a waiting stranger, or open a room for it
    ///
    /// A connection that already holds a seat is rejected and its seat is
    /// left as it was.
    pub fn start(&mut self, connection: &ConnectionId) -> Result<StartOutcome, RegistryError> {
        if let Some((room, _)) = self.registry.find_by_occupant(connection) {
            return Err(RegistryError::AlreadyInRoom {
                connection: connection.clone(),
                room: room.id().clone(),
            });
        }

        let waiting = self
            .registry
            .find_available_excluding(connection)
            .map(|room| room.id().clone());

        match waiting {
            Some(room_id) => {
                let room = self.registry.join(&room_id, connection.clone())?;
                let p1 = room.p1().clone();

                let deliveries = vec![
                    Delivery::new(connection.clone(), ServerEvent::Assigned(Role::P2)),
                    Delivery::new(p1.clone(), ServerEvent::RemoteSocket(connection.clone())),
                    Delivery::new(connection.clone(), ServerEvent::RemoteSocket(p1)),
                    Delivery::new(
                        connection.clone(),
                        ServerEvent::RoomAssigned(room_id.clone()),
                    ),
                ];

                Ok(StartOutcome {
                    role: Role::P2,
                    room_id,
                    deliveries,
                })
            }
            None => {
                let room_id = self.registry.create_room(connection.clone())?;

                let deliveries = vec![
                    Delivery::new(connection.clone(), ServerEvent::Assigned(Role::P1)),
                    Delivery::new(
                        connection.clone(),
                        ServerEvent::RoomAssigned(room_id.clone()),
                    ),
                ];

                Ok(StartOutcome {
                    role: Role::P1,
                    room_id,
                    deliveries,
                })
            }
        }
    }

    /// Look up the slot `connection` holds and the occupant opposite it
    ///
    /// Returns `None` if the connection is not in any room.
    pub fn resolve_counterpart(&self, connection: &ConnectionId) -> Option<Counterpart> {
        let (room, role) = self.registry.find_by_occupant(connection)?;

        Some(Counterpart {
            role,
            room_id: room.id().clone(),
            peer: room.slot(role.opposite()).cloned(),
        })
    }

    /// Forward a negotiation payload to the sender's counterpart
    ///
    /// Dropped without error when there is nobody on the other side.
    pub fn relay_signal(&self, from: &ConnectionId, signal: Signal) -> Option<Delivery> {
        let kind = signal.kind();

        let Some(Counterpart {
            peer: Some(peer), ..
        }) = self.resolve_counterpart(from)
        else {
            tracing::debug!(connection = %from, kind, "No counterpart, signal dropped");
            return None;
        };

        tracing::trace!(connection = %from, to = %peer, kind, "Relaying signal");

        Some(Delivery::new(peer, signal.into_reply(from.clone())))
    }

    /// Broadcast chat text to every other occupant of `room_id`
    ///
    /// The label is picked from the role the sender claims, not the one the
    /// registry holds for it.
    pub fn relay_chat(
        &self,
        sender: &ConnectionId,
        message: &str,
        sender_role: Role,
        room_id: &RoomId,
    ) -> Vec<Delivery> {
        let Some(room) = self.registry.get(room_id) else {
            tracing::debug!(connection = %sender, room = %room_id, "Chat for unknown room dropped");
            return Vec::new();
        };

        let label = match sender_role {
            Role::P1 => OWN_LABEL,
            Role::P2 => STRANGER_LABEL,
        };

        room.others(sender)
            .map(|occupant| {
                Delivery::new(
                    occupant.clone(),
                    ServerEvent::GetMessage {
                        message: message.to_owned(),
                        label: label.to_owned(),
                    },
                )
            })
            .collect()
    }

    /// Remove `connection` from its room and notify whoever is left
    ///
    /// A no-op for connections that hold no seat.
    pub fn disconnect(&mut self, connection: &ConnectionId) -> Option<Delivery> {
        match self.registry.vacate(connection) {
            Ok(vacancy) => vacancy
                .remaining()
                .map(|remaining| Delivery::new(remaining.clone(), ServerEvent::Disconnected)),
            Err(e) => {
                tracing::debug!(connection = %connection, error = %e, "Disconnect outside any room");
                None
            }
        }
    }

    /// Current matchmaking phase of `connection`
    ///
    /// Never reports [`ConnectionPhase::Gone`]; the transport decides that.
    pub fn phase(&self, connection: &ConnectionId) -> ConnectionPhase {
        match self.registry.find_by_occupant(connection) {
            None => ConnectionPhase::Unpaired,
            Some((room, _)) if room.is_available() => ConnectionPhase::Waiting,
            Some(_) => ConnectionPhase::Paired,
        }
    }
}
