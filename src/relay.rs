//! ServerRelay – decides who hears a chat event and sends it to them.
//!
//! ## Dispatch
//!
//! ```text
//! ChatEvent
//!   ├── candidate pool   region snapshot, or every recipient
//!   ├── locality filter  Local / Combat / Action only: range + walls
//!   │     └── agent fan-out (in-process callbacks, independent of recipients)
//!   ├── delivery         always-deliver channels, else event ∩ subscription
//!   └── audit line       once per event
//! ```
//!
//! Dispatch has no error surface. A message that reaches nobody is a normal
//! outcome; every per-recipient decision is recorded in the returned
//! [`DispatchReport`] and logged at `debug`.

use crate::audibility::{Audibility, AudibilityFilter};
use crate::audit::{format_audit_line, AuditSink};
use crate::channel::ChannelSet;
use crate::event::ChatEvent;
use crate::protocol::{ChatEnvelope, ChatUpdate};
use crate::registry::{ChatRegistry, Recipient};
use crate::types::{ConnectionId, EntityId, RelayConfig, RelayStats, SpatialScope, LOCAL_RADIUS};
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;

/// The network transport towards connected clients.
pub trait ConnectionSink: Send + Sync {
    fn send(&self, connection: ConnectionId, envelope: &ChatEnvelope<ChatUpdate>);
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome for one candidate recipient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Sent with this channel set.
    Delivered { channels: ChannelSet },
    /// No body; excluded from locality-scoped chat.
    NoBody,
    OutOfRange { distance: f32 },
    Occluded,
    /// Event channels and the recipient's mask do not overlap.
    Masked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipientDecision {
    pub recipient: EntityId,
    pub connection: ConnectionId,
    pub decision: Decision,
}

/// Explains the side effects of one [`ServerRelay::dispatch`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub seq: u64,
    pub decisions: Vec<RecipientDecision>,
    pub agents_notified: Vec<EntityId>,
    pub audited: bool,
}

impl DispatchReport {
    pub fn decision_for(&self, id: &EntityId) -> Option<Decision> {
        self.decisions
            .iter()
            .find(|d| &d.recipient == id)
            .map(|d| d.decision)
    }

    pub fn delivered_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| matches!(d.decision, Decision::Delivered { .. }))
            .count()
    }

    fn record(&mut self, recipient: &dyn Recipient, decision: Decision) {
        debug!(
            "#{} {} ({}): {:?}",
            self.seq,
            recipient.id(),
            recipient.connection(),
            decision
        );
        self.decisions.push(RecipientDecision {
            recipient: recipient.id().clone(),
            connection: recipient.connection(),
            decision,
        });
    }
}

// ---------------------------------------------------------------------------
// ServerRelay
// ---------------------------------------------------------------------------

pub struct ServerRelay {
    config: RelayConfig,
    filter: AudibilityFilter,
    registry: Arc<dyn ChatRegistry>,
    connections: Arc<dyn ConnectionSink>,
    audit: Option<Arc<dyn AuditSink>>,
    stats: Mutex<RelayStats>,
}

impl ServerRelay {
    pub fn new(
        config: RelayConfig,
        registry: Arc<dyn ChatRegistry>,
        connections: Arc<dyn ConnectionSink>,
    ) -> Self {
        info!(
            "ServerRelay ready (session='{}', local_radius={})",
            config.session, LOCAL_RADIUS
        );
        Self {
            filter: AudibilityFilter::new(LOCAL_RADIUS),
            config,
            registry,
            connections,
            audit: None,
            stats: Mutex::new(RelayStats::default()),
        }
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn stats(&self) -> RelayStats {
        self.stats.lock().clone()
    }

    /// Deliver `event` to everyone entitled to it.
    ///
    /// Safe to call from several threads at once. Each call takes one
    /// registry snapshot up front, so a door toggled or a body moved
    /// mid-dispatch never splits the outcome for a single event.
    pub fn dispatch(&self, event: &ChatEvent) -> DispatchReport {
        let seq = {
            let mut stats = self.stats.lock();
            stats.dispatched += 1;
            stats.dispatched
        };
        let mut report = DispatchReport {
            seq,
            ..Default::default()
        };

        if event.text().is_empty() {
            debug!("#{} empty text, nothing to dispatch", seq);
            return report;
        }

        let view = self.registry.snapshot();
        let pool = candidate_pool(view.as_ref(), event);

        let reachable = if event.is_locality_scoped() {
            let reachable = self.reachable(view.as_ref(), event, pool, &mut report);
            report.agents_notified = self.notify_agents(view.as_ref(), event);
            reachable
        } else {
            pool
        };

        let mut sends = 0;
        for recipient in &reachable {
            let channels = delivery_channels(event.channels(), recipient.as_ref());
            if channels.is_empty() {
                report.record(recipient.as_ref(), Decision::Masked);
                continue;
            }
            let envelope = ChatEnvelope::new(
                self.config.session.as_str(),
                seq,
                ChatUpdate::from_event(event, channels),
            );
            self.connections.send(recipient.connection(), &envelope);
            report.record(recipient.as_ref(), Decision::Delivered { channels });
            sends += 1;
        }

        if let Some(sink) = &self.audit {
            sink.append(&format_audit_line(event));
            report.audited = true;
        }

        let mut stats = self.stats.lock();
        stats.sends += sends;
        stats.agent_deliveries += report.agents_notified.len() as u64;
        stats.audit_lines += u64::from(report.audited);

        report
    }

    /// Build the audible subset as a new sequence; `pool` itself is consumed
    /// without being edited.
    fn reachable(
        &self,
        view: &dyn ChatRegistry,
        event: &ChatEvent,
        pool: Vec<Arc<dyn Recipient>>,
        report: &mut DispatchReport,
    ) -> Vec<Arc<dyn Recipient>> {
        let mut reachable = Vec::with_capacity(pool.len());
        for candidate in pool {
            match self
                .filter
                .recipient(event.origin(), candidate.as_ref(), view)
            {
                Audibility::Audible => reachable.push(candidate),
                Audibility::NoBody => report.record(candidate.as_ref(), Decision::NoBody),
                Audibility::OutOfRange { distance } => {
                    report.record(candidate.as_ref(), Decision::OutOfRange { distance })
                }
                Audibility::Occluded => report.record(candidate.as_ref(), Decision::Occluded),
            }
        }
        reachable
    }

    /// Pass the raw event to every agent in earshot. Hidden-origin events
    /// have no point to hear from and reach no agent.
    fn notify_agents(&self, view: &dyn ChatRegistry, event: &ChatEvent) -> Vec<EntityId> {
        let Some(source) = event.origin().position() else {
            return Vec::new();
        };

        let mut notified = Vec::new();
        for agent in view.agents_in_radius(source, self.filter.radius()) {
            if self.filter.agent_hears(source, agent.as_ref(), view) {
                agent.on_local_chat_received(event);
                notified.push(agent.id().clone());
            }
        }
        notified
    }
}

/// Recipients the event may reach. Unknown regions fall back to every
/// connected recipient.
fn candidate_pool(view: &dyn ChatRegistry, event: &ChatEvent) -> Vec<Arc<dyn Recipient>> {
    match event.scope() {
        SpatialScope::Region(region) => view.recipients_in_region(region).unwrap_or_else(|| {
            debug!("Unknown {}, using global pool", region);
            view.all_recipients()
        }),
        SpatialScope::Global => view.all_recipients(),
    }
}

/// Channels to transmit to `recipient`, or `NONE` for no send.
///
/// Always-deliver channels go out unchanged, except that anything carrying
/// `BINARY` is only unconditional for observers; everyone else falls back to
/// their mask. A recipient without a body only accepts OOC.
pub fn delivery_channels(channels: ChannelSet, recipient: &dyn Recipient) -> ChannelSet {
    if channels.intersects(ChannelSet::ALWAYS_DELIVER)
        && (!channels.contains(ChannelSet::BINARY) || recipient.is_observer())
    {
        return channels;
    }

    let mask = if recipient.position().is_none() {
        ChannelSet::OOC
    } else {
        recipient.subscription_mask(false)
    };
    channels & mask
}
