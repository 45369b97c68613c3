//! Per-connection session tracking

pub mod state;

pub use state::{ConnectionPhase, SessionState};
