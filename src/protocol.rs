//! `chat.*` wire protocol.
//!
//! This module owns **every message that crosses the network boundary**
//! between the relay and a connected client.
//!
//! ## Channel namespaces
//!
//! | Subject             | Direction       | Payload                         |
//! |---------------------|-----------------|---------------------------------|
//! | `chat.update`       | server → client | `ChatEnvelope<ChatUpdate>`      |
//!
//! ## Design rules
//!
//! 1. Every struct is `Serialize + Deserialize` with snake_case JSON.
//! 2. Channel sets travel as their raw integer value.
//! 3. The relay never rewrites text; clients decide what to display.

use crate::channel::{ChannelSet, ChatModifiers};
use crate::event::ChatEvent;
use crate::types::EntityId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Common envelope
// ---------------------------------------------------------------------------

/// Every outbound message is wrapped in this envelope.
///
/// `seq` increases per dispatched event so clients can order interleaved
/// streams from the same session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEnvelope<T> {
    pub session: String,
    pub seq: u64,
    pub payload: T,
}

impl<T> ChatEnvelope<T> {
    pub fn new(session: impl Into<String>, seq: u64, payload: T) -> Self {
        Self {
            session: session.into(),
            seq,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Chat update  (subject: chat.update)
// ---------------------------------------------------------------------------

/// Per-recipient delivery of a chat event.
///
/// `channels` is the set actually used for this recipient: the event's full
/// set on the always-deliver path, or its intersection with the recipient's
/// subscription mask on the masked path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatUpdate {
    pub channels: ChannelSet,
    #[serde(default)]
    pub modifiers: ChatModifiers,
    pub text: String,
    #[serde(default)]
    pub text_for_others: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub originator: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<EntityId>,
}

impl ChatUpdate {
    pub fn from_event(event: &ChatEvent, channels: ChannelSet) -> Self {
        Self {
            channels,
            modifiers: event.modifiers(),
            text: event.text().to_string(),
            text_for_others: event.text_for_others().to_string(),
            originator: event.originator().cloned(),
            speaker: event.speaker().cloned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Admin private message
// ---------------------------------------------------------------------------

/// Direct message from an administrator to one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub text: String,
    pub admin_id: String,
}

// ---------------------------------------------------------------------------
// Subject helpers
// ---------------------------------------------------------------------------

pub mod subjects {
    pub const CHAT_UPDATE: &str = "chat.update";
}
