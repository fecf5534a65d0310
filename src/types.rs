//! Core chat types shared across all modules.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Event origin / scope
// ---------------------------------------------------------------------------

/// Where a chat event was produced.
///
/// `Hidden` means the event has no spatial origin and is audible to every
/// candidate regardless of distance or walls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    #[default]
    Hidden,
    At(Vec2),
}

impl EventOrigin {
    pub fn at(x: f32, y: f32) -> Self {
        Self::At(Vec2::new(x, y))
    }

    pub fn position(&self) -> Option<Vec2> {
        match self {
            Self::Hidden => None,
            Self::At(p) => Some(*p),
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden)
    }
}

/// Identifier of a sub-region ("matrix": a station, shuttle, asteroid …).
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

/// Which candidate pool an event starts from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpatialScope {
    #[default]
    Global,
    Region(RegionId),
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// Identity of an in-world entity (the originator or displayed speaker of a
/// message, a recipient, an agent).
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque handle of a connected client, used by the transport to address a
/// send.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Stats & config
// ---------------------------------------------------------------------------

/// Audibility radius for locality-scoped channels, in world units.
pub const LOCAL_RADIUS: f32 = 14.0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStats {
    /// Events passed to the dispatcher (including short-circuited ones).
    pub dispatched: u64,
    /// Individual network sends to recipient connections.
    pub sends: u64,
    /// Local-chat callbacks delivered to agents.
    pub agent_deliveries: u64,
    /// Lines written to the audit sink.
    pub audit_lines: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Session name stamped on every outbound envelope.
    pub session: String,
    /// Append audit lines to this file (in addition to the log).
    pub audit_log: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            session: "default".into(),
            audit_log: None,
        }
    }
}
