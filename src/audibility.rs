//! Range and line-of-sight checks for locality-scoped chat.

use crate::registry::{Agent, ChatRegistry, Recipient};
use crate::types::{EventOrigin, Vec2};

/// Why a candidate can or cannot hear a locality-scoped event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Audibility {
    Audible,
    /// Joined viewer without a body.
    NoBody,
    OutOfRange { distance: f32 },
    Occluded,
}

#[derive(Debug, Clone, Copy)]
pub struct AudibilityFilter {
    radius: f32,
}

impl AudibilityFilter {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Decide whether `recipient` can hear an event produced at `origin`.
    ///
    /// Checks run in order: body, observer, hidden origin, range, walls.
    pub fn recipient(
        &self,
        origin: EventOrigin,
        recipient: &dyn Recipient,
        registry: &dyn ChatRegistry,
    ) -> Audibility {
        let Some(listener) = recipient.position() else {
            return Audibility::NoBody;
        };
        if recipient.is_observer() {
            return Audibility::Audible;
        }
        let EventOrigin::At(source) = origin else {
            return Audibility::Audible;
        };

        let distance = source.distance(listener);
        if distance > self.radius {
            return Audibility::OutOfRange { distance };
        }
        if registry.occluded(source, listener) {
            return Audibility::Occluded;
        }
        Audibility::Audible
    }

    /// Agents found by the registry's radius query still need a clear line.
    pub fn agent_hears(&self, source: Vec2, agent: &dyn Agent, registry: &dyn ChatRegistry) -> bool {
        !registry.occluded(source, agent.position())
    }
}
