//! Room type and the outcomes of leaving one
//!
//! A room always has its first slot occupied; availability is derived from
//! the second slot, so the two can never disagree.

use std::time::Instant;

use super::key::{ConnectionId, RoomId, Role};

/// A two-slot pairing room
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    p1: ConnectionId,
    p2: Option<ConnectionId>,

    /// Position in the registry's waiting queue, refreshed each time the
    /// room becomes available again
    pub(super) ticket: u64,

    created_at: Instant,
}

impl Room {
    /// Create a room holding a single occupant
    pub fn new(id: RoomId, p1: ConnectionId) -> Self {
        Self {
            id,
            p1,
            p2: None,
            ticket: 0,
            created_at: Instant::now(),
        }
    }

    /// Create a room with both slots filled
    pub fn paired(id: RoomId, p1: ConnectionId, p2: ConnectionId) -> Self {
        Self {
            p2: Some(p2),
            ..Self::new(id, p1)
        }
    }

    /// Room identifier
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Occupant of the first slot
    pub fn p1(&self) -> &ConnectionId {
        &self.p1
    }

    /// Occupant of the second slot, if any
    pub fn p2(&self) -> Option<&ConnectionId> {
        self.p2.as_ref()
    }

    /// Occupant of the given slot
    pub fn slot(&self, role: Role) -> Option<&ConnectionId> {
        match role {
            Role::P1 => Some(&self.p1),
            Role::P2 => self.p2.as_ref(),
        }
    }

    /// Whether the room is waiting for a partner
    pub fn is_available(&self) -> bool {
        self.p2.is_none()
    }

    /// Slot held by `connection`, if it is in this room
    pub fn role_of(&self, connection: &ConnectionId) -> Option<Role> {
        if &self.p1 == connection {
            Some(Role::P1)
        } else if self.p2.as_ref() == Some(connection) {
            Some(Role::P2)
        } else {
            None
        }
    }

    /// Occupants other than `connection`
    pub fn others<'a>(
        &'a self,
        connection: &'a ConnectionId,
    ) -> impl Iterator<Item = &'a ConnectionId> + 'a {
        std::iter::once(&self.p1)
            .chain(self.p2.as_ref())
            .filter(move |occupant| *occupant != connection)
    }

    /// Iterate over all occupants, `p1` first
    pub fn occupants(&self) -> impl Iterator<Item = &ConnectionId> {
        std::iter::once(&self.p1).chain(self.p2.as_ref())
    }

    /// Number of occupied slots (1 or 2)
    pub fn occupant_count(&self) -> usize {
        if self.p2.is_some() {
            2
        } else {
            1
        }
    }

    /// Time since the room was created
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    pub(super) fn seat_p2(&mut self, connection: ConnectionId) {
        self.p2 = Some(connection);
    }

    /// Remove `role` from the room
    ///
    /// Returns the remaining occupant, or `None` when the room is now empty
    /// and must be deleted. Leaving `p1` promotes `p2` into the first slot.
    pub(super) fn leave(&mut self, role: Role) -> Option<ConnectionId> {
        match role {
            Role::P1 => {
                let promoted = self.p2.take()?;
                self.p1 = promoted.clone();
                Some(promoted)
            }
            Role::P2 => self.p2.take().map(|_| self.p1.clone()),
        }
    }
}

/// What happened to a room when one of its occupants left
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vacancy {
    /// `p1` left; `p2` now holds the first slot and the room is waiting again
    Promoted {
        /// Room that was demoted to waiting
        room_id: RoomId,
        /// Former `p2`, now `p1`
        remaining: ConnectionId,
    },
    /// `p2` left; `p1` is waiting for a new partner
    Cleared {
        /// Room that was demoted to waiting
        room_id: RoomId,
        /// The untouched `p1`
        remaining: ConnectionId,
    },
    /// The sole occupant left and the room was removed
    Removed {
        /// Room that no longer exists
        room_id: RoomId,
    },
}

impl Vacancy {
    /// Room the departure happened in
    pub fn room_id(&self) -> &RoomId {
        match self {
            Vacancy::Promoted { room_id, .. }
            | Vacancy::Cleared { room_id, .. }
            | Vacancy::Removed { room_id } => room_id,
        }
    }

    /// Occupant left behind, if the room survived
    pub fn remaining(&self) -> Option<&ConnectionId> {
        match self {
            Vacancy::Promoted { remaining, .. } | Vacancy::Cleared { remaining, .. } => {
                Some(remaining)
            }
            Vacancy::Removed { .. } => None,
        }
    }
}

/// Room counts across the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomStats {
    /// Total rooms
    pub rooms: usize,
    /// Rooms with one occupant, waiting for a partner
    pub waiting: usize,
    /// Rooms with both slots filled
    pub paired: usize,
    /// Connections holding a slot
    pub seated: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(p1: &str, p2: Option<&str>) -> Room {
        let mut room = Room::new(RoomId::from("r"), ConnectionId::from(p1));
        if let Some(p2) = p2 {
            room.seat_p2(ConnectionId::from(p2));
        }
        room
    }

    #[test]
    fn test_availability_follows_second_slot() {
        let mut r = room("a", None);
        assert!(r.is_available());
        assert_eq!(r.occupant_count(), 1);

        r.seat_p2(ConnectionId::from("b"));
        assert!(!r.is_available());
        assert_eq!(r.occupant_count(), 2);
    }

    #[test]
    fn test_role_of() {
        let r = room("a", Some("b"));
        assert_eq!(r.role_of(&"a".into()), Some(Role::P1));
        assert_eq!(r.role_of(&"b".into()), Some(Role::P2));
        assert_eq!(r.role_of(&"c".into()), None);
    }

    #[test]
    fn test_leave_p1_promotes_p2() {
        let mut r = room("a", Some("b"));
        let remaining = r.leave(Role::P1);

        assert_eq!(remaining, Some(ConnectionId::from("b")));
        assert_eq!(r.p1().as_str(), "b");
        assert!(r.p2().is_none());
        assert!(r.is_available());
    }

    #[test]
    fn test_leave_p2_keeps_p1() {
        let mut r = room("a", Some("b"));
        let remaining = r.leave(Role::P2);

        assert_eq!(remaining, Some(ConnectionId::from("a")));
        assert_eq!(r.p1().as_str(), "a");
        assert!(r.is_available());
    }

    #[test]
    fn test_leave_sole_occupant_empties_room() {
        let mut r = room("a", None);
        assert_eq!(r.leave(Role::P1), None);
    }

    #[test]
    fn test_others_excludes_self() {
        let r = room("a", Some("b"));
        let a = ConnectionId::from("a");
        let others: Vec<_> = r.others(&a).collect();
        assert_eq!(others, vec![&ConnectionId::from("b")]);

        let stranger = ConnectionId::from("z");
        assert_eq!(r.others(&stranger).count(), 2);
    }
}
