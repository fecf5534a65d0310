//! The immutable chat event handed to the relay.

use crate::channel::{ChannelSet, ChatModifiers};
use crate::types::{EntityId, EventOrigin, SpatialScope};
use serde::{Deserialize, Serialize};

/// One authored message, built once by the sender and never mutated.
///
/// `text` is what third parties see; `text_for_others` is the variant shown
/// when the display depends on the observer (a disguised speaker, for
/// instance). Both may contain inline markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    text: String,
    #[serde(default)]
    text_for_others: String,
    channels: ChannelSet,
    #[serde(default)]
    modifiers: ChatModifiers,
    #[serde(default)]
    origin: EventOrigin,
    #[serde(default)]
    scope: SpatialScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    originator: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speaker: Option<EntityId>,
}

impl ChatEvent {
    pub fn builder(text: impl Into<String>, channels: ChannelSet) -> ChatEventBuilder {
        ChatEventBuilder::new(text, channels)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn text_for_others(&self) -> &str {
        &self.text_for_others
    }

    pub fn channels(&self) -> ChannelSet {
        self.channels
    }

    pub fn modifiers(&self) -> ChatModifiers {
        self.modifiers
    }

    pub fn origin(&self) -> EventOrigin {
        self.origin
    }

    pub fn scope(&self) -> SpatialScope {
        self.scope
    }

    pub fn originator(&self) -> Option<&EntityId> {
        self.originator.as_ref()
    }

    pub fn speaker(&self) -> Option<&EntityId> {
        self.speaker.as_ref()
    }

    /// `true` if the event is subject to range and line-of-sight filtering.
    pub fn is_locality_scoped(&self) -> bool {
        self.channels.intersects(ChannelSet::LOCALITY_SCOPED)
    }
}

/// Builder for [`ChatEvent`]; the only way to assemble one in code.
#[derive(Debug, Clone)]
pub struct ChatEventBuilder {
    event: ChatEvent,
}

impl ChatEventBuilder {
    pub fn new(text: impl Into<String>, channels: ChannelSet) -> Self {
        Self {
            event: ChatEvent {
                text: text.into(),
                text_for_others: String::new(),
                channels,
                modifiers: ChatModifiers::NONE,
                origin: EventOrigin::Hidden,
                scope: SpatialScope::Global,
                originator: None,
                speaker: None,
            },
        }
    }

    pub fn text_for_others(mut self, text: impl Into<String>) -> Self {
        self.event.text_for_others = text.into();
        self
    }

    pub fn modifiers(mut self, modifiers: ChatModifiers) -> Self {
        self.event.modifiers = modifiers;
        self
    }

    pub fn origin(mut self, origin: EventOrigin) -> Self {
        self.event.origin = origin;
        self
    }

    pub fn scope(mut self, scope: SpatialScope) -> Self {
        self.event.scope = scope;
        self
    }

    pub fn originator(mut self, id: impl Into<EntityId>) -> Self {
        self.event.originator = Some(id.into());
        self
    }

    pub fn speaker(mut self, id: impl Into<EntityId>) -> Self {
        self.event.speaker = Some(id.into());
        self
    }

    pub fn build(self) -> ChatEvent {
        self.event
    }
}
