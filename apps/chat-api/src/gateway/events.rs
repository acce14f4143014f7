//! Gateway opcodes, inbound verbs, delivery channels, and wire-format messages.

use ligo_common::ChatEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Opcodes
// ---------------------------------------------------------------------------

pub const OP_DISPATCH: u8 = 0;
pub const OP_HEARTBEAT: u8 = 1;
pub const OP_HEARTBEAT_ACK: u8 = 6;

// ---------------------------------------------------------------------------
// Inbound verbs
// ---------------------------------------------------------------------------

/// The closed set of client → server event endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    AddUser,
    SendMessage,
    CheckGrammar,
    AskLigobot,
}

impl Verb {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "add-user" => Some(Verb::AddUser),
            "send-message" => Some(Verb::SendMessage),
            "check-grammar" => Some(Verb::CheckGrammar),
            "ask-ligobot" => Some(Verb::AskLigobot),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::AddUser => "add-user",
            Verb::SendMessage => "send-message",
            Verb::CheckGrammar => "check-grammar",
            Verb::AskLigobot => "ask-ligobot",
        }
    }
}

// ---------------------------------------------------------------------------
// Delivery channels
// ---------------------------------------------------------------------------

/// Server → client delivery channels, carried in the `t` field of a dispatch.
pub struct Channel;

impl Channel {
    /// Everyone.
    pub const PUBLIC: &'static str = "/topic/public";
    /// Only the session that asked for a grammar check.
    pub const CHECK_GRAMMAR: &'static str = "/queue/private/checkgrammar";
    /// Only the session that asked the bot.
    pub const ASK_LIGOBOT: &'static str = "/queue/private/askligobot";
    /// Connection handshake.
    pub const READY: &'static str = "READY";
}

/// An event queued for one session's socket.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub channel: &'static str,
    pub event: ChatEvent,
}

// ---------------------------------------------------------------------------
// Server → Client message
// ---------------------------------------------------------------------------

/// A message sent from the server to the client over WebSocket.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayMessage {
    pub op: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    pub d: Value,
}

impl GatewayMessage {
    /// Build a DISPATCH message (op=0).
    pub fn dispatch(channel: &str, seq: u64, data: Value) -> Self {
        Self {
            op: OP_DISPATCH,
            t: Some(channel.to_string()),
            s: Some(seq),
            d: data,
        }
    }

    /// Build the READY dispatch telling the client its session id.
    pub fn ready(session_id: &str, heartbeat_interval_ms: u64) -> Self {
        Self::dispatch(
            Channel::READY,
            0,
            serde_json::json!({
                "session_id": session_id,
                "heartbeat_interval": heartbeat_interval_ms,
            }),
        )
    }

    /// Build a HEARTBEAT_ACK message (op=6).
    pub fn heartbeat_ack(seq: u64) -> Self {
        Self {
            op: OP_HEARTBEAT_ACK,
            t: None,
            s: None,
            d: serde_json::json!({ "ack": seq }),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → Server message
// ---------------------------------------------------------------------------

/// A message received from the client over WebSocket.
#[derive(Debug, Deserialize)]
pub struct ClientMessage {
    pub op: u8,
    #[serde(default)]
    pub t: Option<String>,
    #[serde(default)]
    pub d: Value,
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatPayload {
    #[serde(default)]
    pub seq: u64,
}
