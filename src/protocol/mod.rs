//! Signaling wire protocol
//!
//! JSON text frames exchanged over the WebSocket transport. See
//! [`message`] for the event catalogue.

pub mod message;

pub use message::{ClientEvent, ServerEvent, Signal};
