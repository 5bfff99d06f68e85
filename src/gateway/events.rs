//! Gateway Wire Protocol
//!
//! Tagged-envelope message formats and the codec over them. Decoding is
//! total over unknown input: malformed frames, unknown op codes, and
//! unknown action codes all decode to `None` and are dropped silently, so
//! a newer server can ship frames an older client has never heard of.

use serde::{Deserialize, Serialize};

use crate::domain::{Message, User};

/// Gateway opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Client handshake, carries the bearer token
    Identify = 0,
    /// Heartbeat probe
    Ping = 1,
    /// Heartbeat acknowledgement
    PingAck = 2,
    /// Server-pushed presence/message event
    Action = 3,
    /// Server-reported error
    Error = 4,
}

impl OpCode {
    /// Convert from the wire representation; unknown values are `None`.
    pub fn from_u8(op: u8) -> Option<Self> {
        match op {
            0 => Some(Self::Identify),
            1 => Some(Self::Ping),
            2 => Some(Self::PingAck),
            3 => Some(Self::Action),
            4 => Some(Self::Error),
            _ => None,
        }
    }
}

/// Action codes, meaningful only inside an `Action` frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActionCode {
    None = 0,
    UserReady = 1,
    UserJoin = 2,
    UserLeave = 3,
    UserMessage = 4,
}

impl ActionCode {
    /// Convert from the wire representation; unknown values are `None`.
    pub fn from_u8(action: u8) -> Option<Self> {
        match action {
            0 => Some(Self::None),
            1 => Some(Self::UserReady),
            2 => Some(Self::UserJoin),
            3 => Some(Self::UserLeave),
            4 => Some(Self::UserMessage),
            _ => None,
        }
    }
}

/// Error codes carried by an `Error` frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ErrorCode {
    #[default]
    Unknown = 0,
    PingTimedOut = 1,
    AuthFailed = 2,
}

impl ErrorCode {
    /// Convert from the wire representation, defaulting to `Unknown`.
    pub fn from_u8(code: u8) -> Self {
        match code {
            1 => Self::PingTimedOut,
            2 => Self::AuthFailed,
            _ => Self::Unknown,
        }
    }
}

/// Incoming gateway envelope
#[derive(Debug, Deserialize)]
struct EventReceive {
    op: u8,
    #[serde(default)]
    action: u8,
    #[serde(default)]
    data: serde_json::Value,
}

/// Outgoing gateway envelope
#[derive(Debug, Serialize)]
struct EventSend {
    op: u8,
    action: u8,
    data: serde_json::Value,
}

/// Identify payload
#[derive(Debug, Serialize)]
struct IdentifyData<'a> {
    token: &'a str,
}

/// Ping/ping-ack payload
#[derive(Debug, Serialize, Deserialize)]
struct PingData {
    sequence: u64,
}

/// Outbound chat message payload; sent bare, outside the envelope
#[derive(Debug, Serialize)]
struct OutboundText<'a> {
    text: &'a str,
}

/// Ready payload (full snapshot)
#[derive(Debug, Deserialize)]
struct ReadyData {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    messages: Vec<Message>,
}

/// Join/leave payload
#[derive(Debug, Deserialize)]
struct PresenceData {
    user: User,
}

/// Message payload
#[derive(Debug, Deserialize)]
struct MessageData {
    message: Message,
}

/// Error payload
#[derive(Debug, Deserialize)]
struct ErrorData {
    #[serde(default)]
    code: u8,
    #[serde(default)]
    message: String,
}

/// A decoded server-to-client event.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Heartbeat acknowledgement for the given sequence
    PingAck { sequence: u64 },
    /// Presence/message event to apply to the store
    Action(ActionEvent),
    /// Server-reported error; treated as connection loss
    Error { code: ErrorCode, message: String },
}

/// A decoded presence/message event.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEvent {
    /// Full snapshot of present users and recent messages
    Ready {
        users: Vec<User>,
        messages: Vec<Message>,
    },
    /// A user joined
    Join(User),
    /// A user left
    Leave(User),
    /// A user sent a message
    Message(Message),
}

/// Decode one inbound frame.
///
/// Returns `None` for anything that is not a well-formed event the client
/// understands; the caller drops such frames without surfacing an error.
pub fn decode(text: &str) -> Option<ServerEvent> {
    let raw: EventReceive = serde_json::from_str(text).ok()?;

    match OpCode::from_u8(raw.op)? {
        OpCode::PingAck => {
            let ping: PingData = serde_json::from_value(raw.data).ok()?;
            Some(ServerEvent::PingAck {
                sequence: ping.sequence,
            })
        }
        OpCode::Action => decode_action(ActionCode::from_u8(raw.action)?, raw.data),
        OpCode::Error => {
            let err: ErrorData = serde_json::from_value(raw.data).ok()?;
            Some(ServerEvent::Error {
                code: ErrorCode::from_u8(err.code),
                message: err.message,
            })
        }
        // Client-to-server opcodes arriving inbound are dropped
        OpCode::Identify | OpCode::Ping => None,
    }
}

fn decode_action(code: ActionCode, data: serde_json::Value) -> Option<ServerEvent> {
    let action = match code {
        ActionCode::UserReady => {
            let ready: ReadyData = serde_json::from_value(data).ok()?;
            ActionEvent::Ready {
                users: ready.users,
                messages: ready.messages,
            }
        }
        ActionCode::UserJoin => {
            let presence: PresenceData = serde_json::from_value(data).ok()?;
            ActionEvent::Join(presence.user)
        }
        ActionCode::UserLeave => {
            let presence: PresenceData = serde_json::from_value(data).ok()?;
            ActionEvent::Leave(presence.user)
        }
        ActionCode::UserMessage => {
            let msg: MessageData = serde_json::from_value(data).ok()?;
            ActionEvent::Message(msg.message)
        }
        ActionCode::None => return None,
    };
    Some(ServerEvent::Action(action))
}

/// Encode the identify handshake frame.
pub fn identify(token: &str) -> String {
    envelope(
        OpCode::Identify,
        serde_json::to_value(IdentifyData { token }).unwrap_or_default(),
    )
}

/// Encode a heartbeat probe with the given sequence number.
pub fn ping(sequence: u64) -> String {
    envelope(
        OpCode::Ping,
        serde_json::to_value(PingData { sequence }).unwrap_or_default(),
    )
}

/// Encode an outbound chat message.
///
/// The minimal protocol sends messages as a bare `{text}` object rather
/// than a tagged envelope.
pub fn outbound_message(text: &str) -> String {
    serde_json::to_string(&OutboundText { text }).unwrap_or_default()
}

fn envelope(op: OpCode, data: serde_json::Value) -> String {
    let event = EventSend {
        op: op as u8,
        action: ActionCode::None as u8,
        data,
    };
    serde_json::to_string(&event).unwrap_or_default()
}
