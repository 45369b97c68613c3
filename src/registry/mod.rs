//! Room registry for two-party matchmaking
//!
//! The registry owns every room and is the only mutable state the relay
//! shares between connections.
//!
//! # Architecture
//!
//! ```text
//!                        RoomRegistry
//!              ┌──────────────────────────────┐
//!              │ rooms:     RoomId → Room     │
//!              │ occupants: ConnId → RoomId   │
//!              │ waiting:   ticket → RoomId   │
//!              └──────────────┬───────────────┘
//!                             │
//!        ┌────────────────────┼────────────────────┐
//!        ▼                    ▼                    ▼
//!   create_room()          join()              vacate()
//!   (newcomer → p1)   (newcomer → p2)   (promote / clear / delete)
//! ```
//!
//! # Room lifecycle
//!
//! A room is created waiting with one occupant, becomes paired when a second
//! connection joins, and falls back to waiting when either side leaves. When
//! `p1` leaves a paired room, `p2` is promoted into the first slot. A room is
//! only deleted when its last occupant leaves.

pub mod error;
pub mod key;
pub mod room;
pub mod store;

pub use error::RegistryError;
pub use key::{ConnectionId, Role, RoomId};
pub use room::{Room, RoomStats, Vacancy};
pub use store::RoomRegistry;
