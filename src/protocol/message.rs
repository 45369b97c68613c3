//! Signaling wire messages
//!
//! Every frame is a JSON text message of the form
//! `{"event": <name>, "data": <payload>}`. SDP and ICE payloads are carried
//! as opaque JSON values; the relay never looks inside them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{ConnectionId, Role, RoomId};

/// Events sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Ask to be paired with a stranger
    #[serde(rename = "start")]
    Start,

    /// ICE candidate for the counterpart
    #[serde(rename = "ice:send")]
    IceSend {
        /// Opaque candidate blob
        candidate: Value,
    },

    /// SDP offer or answer for the counterpart
    #[serde(rename = "sdp:send")]
    SdpSend {
        /// Opaque session description blob
        sdp: Value,
    },

    /// Chat text for the rest of the room
    #[serde(rename = "send-message", rename_all = "camelCase")]
    SendMessage {
        /// Message text
        message: String,
        /// Role the sender believes it holds
        sender_role: Role,
        /// Room the message is addressed to
        room_id: RoomId,
    },
}

/// Events delivered to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Acknowledges `start` with the slot the caller now holds
    #[serde(rename = "role")]
    Assigned(Role),

    /// Room the recipient now belongs to
    #[serde(rename = "roomid")]
    RoomAssigned(RoomId),

    /// Identifier of the recipient's new counterpart
    #[serde(rename = "remote-socket")]
    RemoteSocket(ConnectionId),

    /// ICE candidate relayed from the counterpart
    #[serde(rename = "ice:reply")]
    IceReply {
        /// Opaque candidate blob
        candidate: Value,
        /// Sender connection
        from: ConnectionId,
    },

    /// Session description relayed from the counterpart
    #[serde(rename = "sdp:reply")]
    SdpReply {
        /// Opaque session description blob
        sdp: Value,
        /// Sender connection
        from: ConnectionId,
    },

    /// Chat text from another room occupant
    #[serde(rename = "get-message")]
    GetMessage {
        /// Message text
        message: String,
        /// Display label chosen from the sender's role
        label: String,
    },

    /// The counterpart left the room
    #[serde(rename = "disconnected")]
    Disconnected,

    /// Number of live connections on the server
    #[serde(rename = "online")]
    Online(usize),

    /// A frame was rejected
    #[serde(rename = "error")]
    Error {
        /// Human-readable reason
        message: String,
    },
}

impl ServerEvent {
    /// Build an error event
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}

/// Negotiation payload relayed between the two members of a room
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// ICE candidate
    IceCandidate(Value),
    /// SDP offer or answer
    SessionDescription(Value),
}

impl Signal {
    /// Wrap the payload into the reply delivered to the counterpart
    pub fn into_reply(self, from: ConnectionId) -> ServerEvent {
        match self {
            Signal::IceCandidate(candidate) => ServerEvent::IceReply { candidate, from },
            Signal::SessionDescription(sdp) => ServerEvent::SdpReply { sdp, from },
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Signal::IceCandidate(_) => "ice",
            Signal::SessionDescription(_) => "sdp",
        }
    }
}
