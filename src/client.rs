//! Client-side receiver: the last filter before a message reaches the
//! transcript.
//!
//! One [`ClientReceiver`] exists per connection and processes that
//! connection's inbound stream in order. Nothing is shared between
//! receivers.

use crate::channel::ChannelSet;
use crate::protocol::{ChatUpdate, PrivateMessage};
use crate::speech::SpeechExtractor;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The chat window.
pub trait Transcript: Send + Sync {
    fn append(&self, text: &str);
    fn append_admin(&self, text: &str, admin_id: &str);
}

/// Whether this client currently controls an in-world body.
pub trait LocalBody: Send + Sync {
    fn has_body(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// What happened to an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipt {
    /// Empty or whitespace-only text; nothing was done.
    Empty,
    /// Channels resolved to `NONE`; not shown.
    Dropped,
    /// Appended to the transcript under these channels.
    Shown(ChannelSet),
}

pub struct ClientReceiver {
    body: Arc<dyn LocalBody>,
    transcript: Arc<dyn Transcript>,
    speech: SpeechExtractor,
}

impl ClientReceiver {
    pub fn new(
        body: Arc<dyn LocalBody>,
        transcript: Arc<dyn Transcript>,
        speech: SpeechExtractor,
    ) -> Self {
        Self {
            body,
            transcript,
            speech,
        }
    }

    pub fn on_receive(&self, update: &ChatUpdate) -> Receipt {
        self.on_receive_text(&update.text, update.channels)
    }

    /// Process one delivered message.
    ///
    /// A client without a body only ever shows messages as OOC, whatever
    /// the server sent.
    pub fn on_receive_text(&self, text: &str, channels: ChannelSet) -> Receipt {
        if text.trim().is_empty() {
            return Receipt::Empty;
        }

        self.speech.maybe_synthesize(text);

        let channels = if self.body.has_body() {
            channels
        } else {
            ChannelSet::OOC
        };

        if channels.is_empty() {
            log::trace!("Dropping message with no channels");
            return Receipt::Dropped;
        }

        self.transcript.append(text);
        Receipt::Shown(channels)
    }

    /// Admin private messages bypass channel logic entirely.
    pub fn on_private_message(&self, message: &PrivateMessage) {
        self.speech.maybe_synthesize(&message.text);
        self.transcript
            .append_admin(&message.text, &message.admin_id);
    }
}
