//! Wire events exchanged with the chat channel and the history endpoint.
//!
//! Every frame is a JSON object tagged by `"type"`. Field spellings follow the
//! chat server (`order_id`, `user_name`, `is_admin`, ...); the Rust names are
//! the client's own.

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// An event the client emits on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    Join {
        #[serde(rename = "order_id")]
        session_id: String,
    },
    Leave {
        #[serde(rename = "order_id")]
        session_id: String,
    },
    Message {
        #[serde(rename = "order_id")]
        session_id: String,
        #[serde(rename = "message")]
        text: String,
    },
    Typing {
        #[serde(rename = "order_id")]
        session_id: String,
        is_typing: bool,
    },
}

impl OutboundEvent {
    /// The wire `type` tag, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundEvent::Join { .. } => "join",
            OutboundEvent::Leave { .. } => "leave",
            OutboundEvent::Message { .. } => "message",
            OutboundEvent::Typing { .. } => "typing",
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            OutboundEvent::Join { session_id }
            | OutboundEvent::Leave { session_id }
            | OutboundEvent::Message { session_id, .. }
            | OutboundEvent::Typing { session_id, .. } => session_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// A chat message delivered by the channel or loaded from history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "message")]
    pub text: String,
    #[serde(rename = "user_name")]
    pub sender_name: String,
    #[serde(rename = "is_admin")]
    pub is_privileged: bool,
    /// ISO-8601 send time. Some servers omit it on live frames.
    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
}

/// Another participant started or stopped typing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingNotice {
    #[serde(rename = "user_name")]
    pub sender_name: String,
    pub is_typing: bool,
}

/// A system status line, rendered verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    #[serde(rename = "msg")]
    pub text: String,
}

/// An event received from the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Message(InboundMessage),
    Typing(TypingNotice),
    Status(StatusLine),
}

// ---------------------------------------------------------------------------
// History endpoint
// ---------------------------------------------------------------------------

/// One row of `GET /api/chat/messages/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub message: String,
    pub user_name: String,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<HistoryRecord> for InboundMessage {
    fn from(record: HistoryRecord) -> Self {
        InboundMessage {
            text: record.message,
            sender_name: record.user_name,
            is_privileged: record.is_admin,
            sent_at: Some(record.created_at),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame codec
// ---------------------------------------------------------------------------

/// Serialize an outbound event into a text frame.
pub fn encode(event: &OutboundEvent) -> Result<String, ChatError> {
    serde_json::to_string(event).map_err(|e| ChatError::decode("outbound event", e))
}

/// Parse a text frame into an inbound event.
///
/// Unknown `type` tags and missing fields are errors; the caller decides
/// whether to drop the frame.
pub fn decode(frame: &str) -> Result<InboundEvent, ChatError> {
    serde_json::from_str(frame).map_err(|e| ChatError::decode("inbound frame", e))
}
