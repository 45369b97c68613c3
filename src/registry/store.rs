//! Room registry implementation
//!
//! The registry owns every room and keeps two secondary indices in step with
//! each mutation: connection → room, and the queue of rooms waiting for a
//! partner. Both lookups used by matchmaking are therefore O(log n) or better.

use std::collections::{BTreeMap, HashMap};

use super::error::RegistryError;
use super::key::{ConnectionId, RoomId, Role};
use super::room::{Room, RoomStats, Vacancy};

/// Registry of all pairing rooms
///
/// Not internally synchronized. Each method is one atomic unit; callers that
/// share a registry across tasks must hold it behind a single lock.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Map of room id to room
    rooms: HashMap<RoomId, Room>,

    /// Which room each seated connection is in
    occupants: HashMap<ConnectionId, RoomId>,

    /// Waiting rooms ordered by the moment they became available
    waiting: BTreeMap<u64, RoomId>,

    next_ticket: u64,
}

impl RoomRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a waiting room with `occupant` in the first slot
    ///
    /// Fails only if the occupant already holds a slot elsewhere.
    pub fn create_room(&mut self, occupant: ConnectionId) -> Result<RoomId, RegistryError> {
        if let Some(room) = self.occupants.get(&occupant) {
            return Err(RegistryError::AlreadyInRoom {
                connection: occupant,
                room: room.clone(),
            });
        }

        let mut id = RoomId::generate();
        while self.rooms.contains_key(&id) {
            id = RoomId::generate();
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let mut room = Room::new(id.clone(), occupant.clone());
        room.ticket = ticket;

        self.waiting.insert(ticket, id.clone());
        self.occupants.insert(occupant.clone(), id.clone());
        self.rooms.insert(id.clone(), room);

        tracing::info!(room = %id, connection = %occupant, "Room created");

        Ok(id)
    }

    /// Find a waiting room whose first slot is not `exclude`
    ///
    /// Rooms are offered oldest-waiting first.
    pub fn find_available_excluding(&self, exclude: &ConnectionId) -> Option<&Room> {
        self.waiting
            .values()
            .filter_map(|id| self.rooms.get(id))
            .find(|room| room.p1() != exclude)
    }

    /// Get a room by id
    pub fn get(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    /// Insert or replace a room, re-indexing its occupants
    ///
    /// Rejects a room whose occupants are already seated in a different room,
    /// or whose two slots hold the same connection. Returns the replaced room.
    pub fn put(&mut self, mut room: Room) -> Result<Option<Room>, RegistryError> {
        if room.p2() == Some(room.p1()) {
            return Err(RegistryError::AlreadyInRoom {
                connection: room.p1().clone(),
                room: room.id().clone(),
            });
        }

        for occupant in room.occupants() {
            if let Some(existing) = self.occupants.get(occupant) {
                if existing != room.id() {
                    return Err(RegistryError::AlreadyInRoom {
                        connection: occupant.clone(),
                        room: existing.clone(),
                    });
                }
            }
        }

        let id = room.id().clone();
        let previous = self.delete(&id);

        if room.is_available() {
            let ticket = self.next_ticket;
            self.next_ticket += 1;
            room.ticket = ticket;
            self.waiting.insert(ticket, id.clone());
        }
        for occupant in room.occupants() {
            self.occupants.insert(occupant.clone(), id.clone());
        }
        self.rooms.insert(id, room);

        Ok(previous)
    }

    /// Remove a room and release its occupants
    pub fn delete(&mut self, id: &RoomId) -> Option<Room> {
        let room = self.rooms.remove(id)?;

        if room.is_available() {
            self.waiting.remove(&room.ticket);
        }
        for occupant in room.occupants() {
            self.occupants.remove(occupant);
        }

        Some(room)
    }

    /// Find the room a connection occupies and the slot it holds
    pub fn find_by_occupant(&self, connection: &ConnectionId) -> Option<(&Room, Role)> {
        let room = self.rooms.get(self.occupants.get(connection)?)?;
        let role = room.role_of(connection)?;
        Some((room, role))
    }

    /// Seat `connection` in the second slot of a waiting room
    pub fn join(
        &mut self,
        id: &RoomId,
        connection: ConnectionId,
    ) -> Result<&Room, RegistryError> {
        if let Some(room) = self.occupants.get(&connection) {
            return Err(RegistryError::AlreadyInRoom {
                connection,
                room: room.clone(),
            });
        }

        let room = self
            .rooms
            .get_mut(id)
            .ok_or_else(|| RegistryError::RoomNotFound(id.clone()))?;

        if !room.is_available() {
            return Err(RegistryError::RoomFull(id.clone()));
        }

        room.seat_p2(connection.clone());
        self.waiting.remove(&room.ticket);
        self.occupants.insert(connection.clone(), id.clone());

        tracing::info!(
            room = %id,
            p1 = %room.p1(),
            p2 = %connection,
            "Room paired"
        );

        Ok(&*room)
    }

    /// Remove `connection` from its room
    ///
    /// Leaving a paired room demotes it to waiting (promoting `p2` when `p1`
    /// left). Leaving as the sole occupant deletes the room.
    pub fn vacate(&mut self, connection: &ConnectionId) -> Result<Vacancy, RegistryError> {
        let not_seated = || RegistryError::NotInAnyRoom(connection.clone());

        let id = self.occupants.remove(connection).ok_or_else(not_seated)?;
        let room = self.rooms.get_mut(&id).ok_or_else(not_seated)?;
        let role = room.role_of(connection).ok_or_else(not_seated)?;

        match room.leave(role) {
            Some(remaining) => {
                let ticket = self.next_ticket;
                self.next_ticket += 1;
                room.ticket = ticket;
                self.waiting.insert(ticket, id.clone());

                tracing::info!(
                    room = %id,
                    left = %connection,
                    remaining = %remaining,
                    role = %role,
                    "Partner left, room waiting again"
                );

                Ok(match role {
                    Role::P1 => Vacancy::Promoted {
                        room_id: id,
                        remaining,
                    },
                    Role::P2 => Vacancy::Cleared {
                        room_id: id,
                        remaining,
                    },
                })
            }
            None => {
                let ticket = room.ticket;
                let age = room.age();
                self.waiting.remove(&ticket);
                self.rooms.remove(&id);

                tracing::info!(
                    room = %id,
                    connection = %connection,
                    age_ms = age.as_millis() as u64,
                    "Room deleted"
                );

                Ok(Vacancy::Removed { room_id: id })
            }
        }
    }

    /// Whether `connection` holds a slot in any room
    pub fn is_seated(&self, connection: &ConnectionId) -> bool {
        self.occupants.contains_key(connection)
    }

    /// Iterate over all rooms in unspecified order
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Get total number of rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether the registry holds no rooms
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Room counts for display
    pub fn stats(&self) -> RoomStats {
        let waiting = self.waiting.len();
        RoomStats {
            rooms: self.rooms.len(),
            waiting,
            paired: self.rooms.len() - waiting,
            seated: self.occupants.len(),
        }
    }
}
