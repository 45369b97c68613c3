//! Crate-level error type

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the signaling server
#[derive(Debug, Error)]
pub enum Error {
    /// Socket I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket protocol failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Frame could not be encoded or decoded
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Client did not finish the WebSocket handshake in time
    #[error("handshake not completed within {0:?}")]
    HandshakeTimeout(Duration),

    /// Text frame exceeded the configured soft limit
    #[error("frame too large: {size} bytes, limit {limit}")]
    FrameTooLarge {
        /// Received frame length
        size: usize,
        /// Configured limit
        limit: usize,
    },
}

/// Result alias using the crate error type
pub type Result<T> = std::result::Result<T, Error>;
