//! Janet Chat Relay
//!
//! Server-authoritative chat dispatch for the janet world: given a chat
//! event, decide exactly which connected clients and which in-world agents
//! hear it, then send it to them.
//!
//! ## Architecture
//!
//! ```text
//! server                                    client (per connection)
//! ──────                                    ──────────────────────
//! ServerRelay  (relay.rs)                   ClientReceiver  (client.rs)
//!   ├── ChatRegistry  (registry.rs)           ├── SpeechExtractor (speech.rs)
//!   │     └── World   (world.rs)              └── Transcript
//!   ├── AudibilityFilter (audibility.rs)
//!   ├── ConnectionSink ──── ChatEnvelope<ChatUpdate> (protocol.rs) ───▶
//!   └── AuditSink     (audit.rs)
//! ```
//!
//! Channel categories live in `channel.rs`; everything the relay does is
//! driven by [`ChannelSet`] bit tests.

// Protocol and client-side types are always available (no server feature needed).
pub mod channel;
pub mod client;
pub mod error;
pub mod event;
pub mod protocol;
pub mod speech;
pub mod types;

// Server-side modules require the `server` feature.
#[cfg(feature = "server")]
pub mod audibility;
#[cfg(feature = "server")]
pub mod audit;
#[cfg(feature = "server")]
pub mod feed;
#[cfg(feature = "server")]
pub mod registry;
#[cfg(feature = "server")]
pub mod relay;
#[cfg(feature = "server")]
pub mod world;

// Convenience re-exports (server only)
#[cfg(feature = "server")]
pub use relay::{ConnectionSink, Decision, DispatchReport, ServerRelay};
#[cfg(feature = "server")]
pub use registry::{Agent, ChatRegistry, Recipient};
#[cfg(feature = "server")]
pub use world::{Body, Participant, SoundBlocker, World};
pub use channel::{ChannelSet, ChatModifiers};
pub use client::{ClientReceiver, Receipt};
pub use error::{ChatError, Result};
pub use event::ChatEvent;
pub use types::{EntityId, EventOrigin, RegionId, RelayConfig, RelayStats, SpatialScope, Vec2};
