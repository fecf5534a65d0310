//! In-memory chat world: participants, listening agents and sound-blocking
//! geometry, plus the top-level [`World`] registry the relay reads from.
//!
//! Game logic mutates the world (moves bodies, opens doors) while the relay
//! takes snapshots. Participants are stored behind `Arc` and replaced
//! wholesale on update, so a snapshot never observes a half-written entry.

use crate::channel::ChannelSet;
use crate::error::Result;
use crate::event::ChatEvent;
use crate::registry::{Agent, ChatRegistry, Recipient};
use crate::types::{ConnectionId, EntityId, RegionId, Vec2};
use log::debug;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// The controlled body of a participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vec2,
    /// Ghost / spectator.
    pub observer: bool,
    /// Channels the body can currently hear (headset, species, role …).
    pub channels: ChannelSet,
    /// Additional channels only visible when admin channels are requested.
    pub admin_channels: ChannelSet,
}

impl Body {
    pub fn new(position: Vec2, channels: ChannelSet) -> Self {
        Self {
            position,
            observer: false,
            channels,
            admin_channels: ChannelSet::NONE,
        }
    }

    pub fn observer(position: Vec2) -> Self {
        Self {
            position,
            observer: true,
            channels: ChannelSet::OOC | ChannelSet::GHOST,
            admin_channels: ChannelSet::NONE,
        }
    }
}

/// A connected player. `body == None` is a joined viewer in the lobby.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: EntityId,
    pub connection: ConnectionId,
    pub region: Option<RegionId>,
    pub body: Option<Body>,
}

impl Participant {
    pub fn new(id: impl Into<EntityId>, connection: ConnectionId) -> Self {
        Self {
            id: id.into(),
            connection,
            region: None,
            body: None,
        }
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn in_region(mut self, region: RegionId) -> Self {
        self.region = Some(region);
        self
    }
}

impl Recipient for Participant {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn connection(&self) -> ConnectionId {
        self.connection
    }

    fn position(&self) -> Option<Vec2> {
        self.body.as_ref().map(|b| b.position)
    }

    fn is_observer(&self) -> bool {
        self.body.as_ref().is_some_and(|b| b.observer)
    }

    fn subscription_mask(&self, include_admin_channels: bool) -> ChannelSet {
        match &self.body {
            None => ChannelSet::NONE,
            Some(b) if include_admin_channels => b.channels | b.admin_channels,
            Some(b) => b.channels,
        }
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// An agent that remembers every local chat event it hears.
///
/// Stands in for mob AI in scenarios and tests.
pub struct ListeningAgent {
    id: EntityId,
    position: Vec2,
    heard: Mutex<Vec<ChatEvent>>,
}

impl ListeningAgent {
    pub fn new(id: impl Into<EntityId>, position: Vec2) -> Self {
        Self {
            id: id.into(),
            position,
            heard: Mutex::new(Vec::new()),
        }
    }

    pub fn heard(&self) -> Vec<ChatEvent> {
        self.heard.lock().clone()
    }
}

impl Agent for ListeningAgent {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn on_local_chat_received(&self, event: &ChatEvent) {
        debug!("Agent {} heard: {}", self.id, event.text());
        self.heard.lock().push(event.clone());
    }
}

// ---------------------------------------------------------------------------
// Sound blockers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerKind {
    Wall,
    Door,
}

/// A straight wall or door segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundBlocker {
    pub id: String,
    pub kind: BlockerKind,
    pub from: Vec2,
    pub to: Vec2,
    /// Only meaningful for doors; walls always block.
    #[serde(default = "default_closed")]
    pub closed: bool,
}

fn default_closed() -> bool {
    true
}

impl SoundBlocker {
    pub fn wall(id: impl Into<String>, from: Vec2, to: Vec2) -> Self {
        Self {
            id: id.into(),
            kind: BlockerKind::Wall,
            from,
            to,
            closed: true,
        }
    }

    pub fn door(id: impl Into<String>, from: Vec2, to: Vec2, closed: bool) -> Self {
        Self {
            id: id.into(),
            kind: BlockerKind::Door,
            from,
            to,
            closed,
        }
    }

    pub fn blocks_sound(&self) -> bool {
        match self.kind {
            BlockerKind::Wall => true,
            BlockerKind::Door => self.closed,
        }
    }

    pub fn crosses(&self, a: Vec2, b: Vec2) -> bool {
        segments_intersect(a, b, self.from, self.to)
    }
}

/// Holds all sound blockers placed in the world.
#[derive(Debug, Clone, Default)]
pub(crate) struct BlockerRegistry {
    blockers: BTreeMap<String, SoundBlocker>,
}

impl BlockerRegistry {
    pub fn insert(&mut self, blocker: SoundBlocker) {
        self.blockers.insert(blocker.id.clone(), blocker);
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SoundBlocker> {
        self.blockers.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.blockers.len()
    }

    /// Return all blockers whose bounding box overlaps the given world
    /// rectangle.
    pub fn query_rect(&self, min: Vec2, max: Vec2) -> impl Iterator<Item = &SoundBlocker> + '_ {
        self.blockers.values().filter(move |s| {
            s.from.x.max(s.to.x) >= min.x
                && s.from.x.min(s.to.x) <= max.x
                && s.from.y.max(s.to.y) >= min.y
                && s.from.y.min(s.to.y) <= max.y
        })
    }

    /// Line-of-sound test between two points.
    pub fn occluded(&self, a: Vec2, b: Vec2) -> bool {
        let min = Vec2::new(a.x.min(b.x), a.y.min(b.y));
        let max = Vec2::new(a.x.max(b.x), a.y.max(b.y));
        self.query_rect(min, max)
            .any(|s| s.blocks_sound() && s.crosses(a, b))
    }
}

fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn on_segment(p: Vec2, a: Vec2, b: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Closed-segment intersection, touching and collinear overlap included.
fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(p1, q1, q2))
        || (d2 == 0.0 && on_segment(p2, q1, q2))
        || (d3 == 0.0 && on_segment(q1, p1, p2))
        || (d4 == 0.0 && on_segment(q2, p1, p2))
}

// ---------------------------------------------------------------------------
// Scenario (file format)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub regions: Vec<u32>,
    pub participants: Vec<ParticipantSpec>,
    pub agents: Vec<AgentSpec>,
    pub blockers: Vec<SoundBlocker>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantSpec {
    pub id: String,
    pub connection: u64,
    #[serde(default)]
    pub region: Option<u32>,
    /// Omit for a bodiless viewer.
    #[serde(default)]
    pub position: Option<Vec2>,
    #[serde(default)]
    pub observer: bool,
    /// Channel names, e.g. `"OOC, Local, Common"`.
    #[serde(default)]
    pub channels: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: String,
    pub position: Vec2,
}

impl Scenario {
    /// Load a scenario file; the format (TOML, JSON, …) follows the
    /// extension.
    pub fn load(path: &Path) -> Result<Self> {
        let scenario = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize::<Scenario>()?;
        Ok(scenario)
    }
}

// ---------------------------------------------------------------------------
// World (registry)
// ---------------------------------------------------------------------------

/// Blockers sit behind an `Arc` so a snapshot shares them until the next
/// door toggle copies them.
#[derive(Clone, Default)]
struct WorldState {
    regions: BTreeSet<RegionId>,
    participants: BTreeMap<EntityId, Arc<Participant>>,
    agents: BTreeMap<EntityId, Arc<dyn Agent>>,
    blockers: Arc<BlockerRegistry>,
}

impl WorldState {
    fn recipients_in_region(&self, region: RegionId) -> Option<Vec<Arc<dyn Recipient>>> {
        if !self.regions.contains(&region) {
            return None;
        }
        Some(
            self.participants
                .values()
                .filter(|p| p.region == Some(region))
                .map(|p| p.clone() as Arc<dyn Recipient>)
                .collect(),
        )
    }

    fn all_recipients(&self) -> Vec<Arc<dyn Recipient>> {
        self.participants
            .values()
            .map(|p| p.clone() as Arc<dyn Recipient>)
            .collect()
    }

    fn agents_in_radius(&self, center: Vec2, radius: f32) -> Vec<Arc<dyn Agent>> {
        self.agents
            .values()
            .filter(|a| a.position().distance(center) <= radius)
            .cloned()
            .collect()
    }
}

/// Shared, externally-owned registry. Cheap to read concurrently.
#[derive(Default)]
pub struct World {
    state: RwLock<WorldState>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_scenario(scenario: Scenario) -> Result<Self> {
        let world = Self::new();
        for region in scenario.regions {
            world.add_region(RegionId(region));
        }
        for spec in scenario.participants {
            let mut participant = Participant::new(spec.id.as_str(), ConnectionId(spec.connection));
            if let Some(region) = spec.region {
                participant = participant.in_region(RegionId(region));
            }
            if let Some(position) = spec.position {
                let channels = spec.channels.parse::<ChannelSet>()?;
                let body = if spec.observer {
                    let mut body = Body::observer(position);
                    body.channels |= channels;
                    body
                } else {
                    Body::new(position, channels)
                };
                participant = participant.with_body(body);
            }
            world.upsert_participant(participant);
        }
        for spec in scenario.agents {
            world.add_agent(Arc::new(ListeningAgent::new(spec.id.as_str(), spec.position)));
        }
        for blocker in scenario.blockers {
            world.add_blocker(blocker);
        }
        Ok(world)
    }

    // -----------------------------------------------------------------------
    // Mutation (game logic side)
    // -----------------------------------------------------------------------

    pub fn add_region(&self, region: RegionId) {
        self.state.write().regions.insert(region);
    }

    /// Insert or replace a participant. Its region becomes known.
    pub fn upsert_participant(&self, participant: Participant) {
        let mut state = self.state.write();
        if let Some(region) = participant.region {
            state.regions.insert(region);
        }
        state
            .participants
            .insert(participant.id.clone(), Arc::new(participant));
    }

    pub fn remove_participant(&self, id: &EntityId) -> Option<Arc<Participant>> {
        self.state.write().participants.remove(id)
    }

    /// Move a participant's body. Returns `false` if it has none.
    pub fn move_participant(&self, id: &EntityId, position: Vec2) -> bool {
        let mut state = self.state.write();
        let Some(current) = state.participants.get(id) else {
            return false;
        };
        let mut next = Participant::clone(current);
        match next.body.as_mut() {
            Some(body) => body.position = position,
            None => return false,
        }
        state.participants.insert(id.clone(), Arc::new(next));
        true
    }

    pub fn participant(&self, id: &EntityId) -> Option<Arc<Participant>> {
        self.state.read().participants.get(id).cloned()
    }

    pub fn participant_count(&self) -> usize {
        self.state.read().participants.len()
    }

    pub fn add_agent(&self, agent: Arc<dyn Agent>) {
        self.state.write().agents.insert(agent.id().clone(), agent);
    }

    pub fn add_blocker(&self, blocker: SoundBlocker) {
        Arc::make_mut(&mut self.state.write().blockers).insert(blocker);
    }

    /// Open or close a door. Returns `false` if no such door exists.
    pub fn set_door_closed(&self, id: &str, closed: bool) -> bool {
        let mut state = self.state.write();
        match Arc::make_mut(&mut state.blockers).get_mut(id) {
            Some(b) if b.kind == BlockerKind::Door => {
                b.closed = closed;
                debug!("Door {} {}", id, if closed { "closed" } else { "opened" });
                true
            }
            _ => false,
        }
    }

    pub fn blocker_count(&self) -> usize {
        self.state.read().blockers.len()
    }
}

impl ChatRegistry for World {
    fn recipients_in_region(&self, region: RegionId) -> Option<Vec<Arc<dyn Recipient>>> {
        self.state.read().recipients_in_region(region)
    }

    fn all_recipients(&self) -> Vec<Arc<dyn Recipient>> {
        self.state.read().all_recipients()
    }

    fn agents_in_radius(&self, center: Vec2, radius: f32) -> Vec<Arc<dyn Agent>> {
        self.state.read().agents_in_radius(center, radius)
    }

    fn occluded(&self, a: Vec2, b: Vec2) -> bool {
        self.state.read().blockers.occluded(a, b)
    }

    fn snapshot(&self) -> Arc<dyn ChatRegistry> {
        Arc::new(WorldSnapshot(self.state.read().clone()))
    }
}

/// The world frozen under a single read lock.
struct WorldSnapshot(WorldState);

impl ChatRegistry for WorldSnapshot {
    fn recipients_in_region(&self, region: RegionId) -> Option<Vec<Arc<dyn Recipient>>> {
        self.0.recipients_in_region(region)
    }

    fn all_recipients(&self) -> Vec<Arc<dyn Recipient>> {
        self.0.all_recipients()
    }

    fn agents_in_radius(&self, center: Vec2, radius: f32) -> Vec<Arc<dyn Agent>> {
        self.0.agents_in_radius(center, radius)
    }

    fn occluded(&self, a: Vec2, b: Vec2) -> bool {
        self.0.blockers.occluded(a, b)
    }

    fn snapshot(&self) -> Arc<dyn ChatRegistry> {
        Arc::new(WorldSnapshot(self.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn crossing_segments_intersect() {
        assert!(segments_intersect(p(0.0, 0.0), p(4.0, 4.0), p(0.0, 4.0), p(4.0, 0.0)));
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 1.0), p(3.0, 0.0), p(3.0, 5.0)));
    }

    #[test]
    fn touching_endpoint_counts_as_intersection() {
        assert!(segments_intersect(p(0.0, 0.0), p(2.0, 0.0), p(2.0, -1.0), p(2.0, 1.0)));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(!segments_intersect(p(0.0, 0.0), p(5.0, 0.0), p(0.0, 1.0), p(5.0, 1.0)));
    }

    #[test]
    fn open_door_lets_sound_through() {
        let mut reg = BlockerRegistry::default();
        reg.insert(SoundBlocker::door("d1", p(2.0, -1.0), p(2.0, 1.0), false));
        assert!(!reg.occluded(p(0.0, 0.0), p(4.0, 0.0)));
        reg.get_mut("d1").unwrap().closed = true;
        assert!(reg.occluded(p(0.0, 0.0), p(4.0, 0.0)));
    }

    #[test]
    fn snapshot_is_frozen_against_later_mutation() {
        let world = World::new();
        world.add_blocker(SoundBlocker::door("d1", p(2.0, -1.0), p(2.0, 1.0), false));
        world.upsert_participant(
            Participant::new("alice", ConnectionId(1))
                .with_body(Body::new(p(4.0, 0.0), ChannelSet::LOCAL)),
        );

        let view = world.snapshot();
        assert!(world.set_door_closed("d1", true));
        assert!(world.move_participant(&EntityId::new("alice"), p(40.0, 0.0)));
        world.upsert_participant(Participant::new("bob", ConnectionId(2)));

        assert!(!view.occluded(p(0.0, 0.0), p(4.0, 0.0)));
        assert!(world.occluded(p(0.0, 0.0), p(4.0, 0.0)));
        let recipients = view.all_recipients();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].position(), Some(p(4.0, 0.0)));
    }
}
