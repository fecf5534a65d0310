//! The relay's view of the world: recipients, agents and sound-blocking
//! geometry.
//!
//! Every query returns an owned snapshot. The relay takes one
//! [`ChatRegistry::snapshot`] per event, answers every range and occlusion
//! question from it, and never writes back into the registry.

use crate::channel::ChannelSet;
use crate::event::ChatEvent;
use crate::types::{ConnectionId, EntityId, RegionId, Vec2};
use std::sync::Arc;

/// A connected client that may receive chat.
pub trait Recipient: Send + Sync {
    fn id(&self) -> &EntityId;

    fn connection(&self) -> ConnectionId;

    /// World position of the controlled body; `None` for a joined viewer
    /// that has no body yet.
    fn position(&self) -> Option<Vec2>;

    /// Ghosts and spectators hear everything regardless of distance.
    fn is_observer(&self) -> bool;

    /// Channels this recipient currently accepts.
    ///
    /// Must be side-effect free. The relay always passes `false`.
    fn subscription_mask(&self, include_admin_channels: bool) -> ChannelSet;
}

/// A non-player listener (mob AI) that reacts to local speech in-process.
pub trait Agent: Send + Sync {
    fn id(&self) -> &EntityId;

    fn position(&self) -> Vec2;

    fn on_local_chat_received(&self, event: &ChatEvent);
}

pub trait ChatRegistry: Send + Sync {
    /// Recipients currently in `region`, or `None` if the region is unknown.
    fn recipients_in_region(&self, region: RegionId) -> Option<Vec<Arc<dyn Recipient>>>;

    fn all_recipients(&self) -> Vec<Arc<dyn Recipient>>;

    /// Agents whose position lies within `radius` of `center`.
    fn agents_in_radius(&self, center: Vec2, radius: f32) -> Vec<Arc<dyn Agent>>;

    /// `true` if sound-blocking geometry (walls, closed doors) crosses the
    /// straight line from `a` to `b`.
    fn occluded(&self, a: Vec2, b: Vec2) -> bool;

    /// Freeze recipients, agents and geometry as of one instant. Later
    /// changes to `self` are not visible through the returned view.
    fn snapshot(&self) -> Arc<dyn ChatRegistry>;
}
