//! `{type, data}` envelope framing (spec.md §4.7).
//!
//! Mirrors the teacher's single tagged-event precedent (`ChatEvent` in
//! `src/events.rs`) but two-staged: the outer `type` is decoded first, and
//! `data` is held as a [`RawValue`] until the matching handler in
//! `crate::handlers` re-decodes it into its own request shape. Outbound
//! frames are built the same way in reverse — each handler serializes its
//! own reply/broadcast payload and wraps it with [`Envelope::reply`] or
//! [`Envelope::broadcast`] once; the transport never re-encodes.

pub mod requests;
pub mod responses;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// The wire frame. `data` stays opaque until a handler knows which shape to
/// parse it as (spec.md §4.7 — "the codec decodes the outer object with
/// `data` held as an opaque byte slice").
#[derive(Debug, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Box<RawValue>,
}

/// An outbound frame, built once by a handler and never mutated afterwards.
#[derive(Debug, Serialize, Clone)]
pub struct OutboundEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: serde_json::Value,
}

impl OutboundEnvelope {
    pub fn new(kind: &str, data: impl Serialize) -> Self {
        Self {
            kind: kind.to_string(),
            data: serde_json::to_value(data).unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new("error", responses::ErrorReply { message: message.into() })
    }

    /// Serialize to the single-line text form the write pump sends over the
    /// socket (one JSON object per line, coalesced frames joined by `\n`
    /// per spec.md §4.6).
    pub fn to_frame_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"type":"error","data":{"message":"failed to serialize reply"}}"#.to_string()
        })
    }
}

/// What a handler hands back to the dispatcher: a unicast reply to the
/// caller, a broadcast to a room, or both (spec.md §4.4's routing table).
/// `set_current_room` is populated only by the handful of handlers spec.md
/// §4.6 names (`init`, `join_room`, `create_room`, `create_dm`,
/// `leave_room`) — the read pump, not the hub, applies it to the
/// connection's `current_room_id`.
pub struct HandlerOutcome {
    pub reply: Option<OutboundEnvelope>,
    pub broadcast: Option<(String, OutboundEnvelope)>,
    pub set_current_room: Option<Option<String>>,
}

impl HandlerOutcome {
    pub fn reply_only(env: OutboundEnvelope) -> Self {
        Self { reply: Some(env), broadcast: None, set_current_room: None }
    }

    pub fn reply_and_broadcast(reply: OutboundEnvelope, room_id: impl Into<String>, broadcast: OutboundEnvelope) -> Self {
        Self {
            reply: Some(reply),
            broadcast: Some((room_id.into(), broadcast)),
            set_current_room: None,
        }
    }

    pub fn broadcast_only(room_id: impl Into<String>, broadcast: OutboundEnvelope) -> Self {
        Self { reply: None, broadcast: Some((room_id.into(), broadcast)), set_current_room: None }
    }

    pub fn with_current_room(mut self, room_id: Option<String>) -> Self {
        self.set_current_room = Some(room_id);
        self
    }
}
