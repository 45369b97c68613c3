//! Registry error types

use thiserror::Error;

use super::key::{ConnectionId, RoomId};

/// Error type for registry operations
///
/// None of these are fatal: the relay logs them and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Connection does not occupy any room
    #[error("connection {0} is not in any room")]
    NotInAnyRoom(ConnectionId),

    /// Connection already holds a slot, seating it again would break uniqueness
    #[error("connection {connection} already occupies room {room}")]
    AlreadyInRoom {
        /// The connection that asked to be seated
        connection: ConnectionId,
        /// Room it is already in
        room: RoomId,
    },

    /// No room with this identifier
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// Room already has both slots filled
    #[error("room {0} is full")]
    RoomFull(RoomId),
}
