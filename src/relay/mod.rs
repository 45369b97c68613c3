//! Matchmaking and message relay
//!
//! The [`Matchmaker`] consumes connection events, drives the
//! [`RoomRegistry`](crate::registry::RoomRegistry) and returns the deliveries
//! the transport must perform. It is synchronous and performs no I/O, so each
//! call is one atomic step of the room state machine.
//!
//! ```text
//!  transport ──start / ice:send / sdp:send / send-message / disconnect──►
//!                               Matchmaker
//!                                   │ registry transition
//!                                   ▼
//!  transport ◄──────────── Vec<Delivery> (to, event)
//! ```

pub mod delivery;
pub mod matchmaker;

pub use delivery::Delivery;
pub use matchmaker::{Counterpart, Matchmaker, StartOutcome, OWN_LABEL, STRANGER_LABEL};
