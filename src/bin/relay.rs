//! janet-chat-relay binary
//!
//! Loads a world scenario, then reads one JSON `ChatEvent` per line from
//! stdin and dispatches it. Every network send is written to stdout as a
//! JSON line `{ "subject", "connection", "envelope" }`.
//!
//! ## Configuration (CLI / env, layered over an optional TOML file)
//!
//! | Key                  | Default   | Description                          |
//! |----------------------|-----------|--------------------------------------|
//! | `CHAT_SCENARIO`      | —         | Scenario file (participants, walls…) |
//! | `CHAT_CONFIG`        | —         | `RelayConfig` file (TOML / JSON)     |
//! | `CHAT_SESSION`       | `default` | Session stamped on envelopes         |
//! | `CHAT_AUDIT_LOG`     | —         | Append audit lines to this file      |

use anyhow::{Context, Result};
use clap::Parser;
use janet_chat::{
    audit::{AuditSink, FileAuditSink, LogAuditSink, TeeAuditSink},
    feed::run_feed,
    protocol::{subjects, ChatEnvelope, ChatUpdate},
    relay::{ConnectionSink, ServerRelay},
    types::{ConnectionId, RelayConfig},
    world::{Scenario, World},
};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "janet-chat-relay", about = "Janet Chat Relay", version)]
struct Args {
    /// World scenario to load
    #[arg(long, env = "CHAT_SCENARIO")]
    scenario: PathBuf,

    /// Relay config file
    #[arg(long, env = "CHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Session name
    #[arg(long, env = "CHAT_SESSION")]
    session: Option<String>,

    /// Audit log file
    #[arg(long, env = "CHAT_AUDIT_LOG")]
    audit_log: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<RelayConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = &args.config {
        builder = builder.add_source(config::File::from(path.as_path()));
    }
    let mut config: RelayConfig = builder
        .build()
        .and_then(|c| c.try_deserialize())
        .context("Failed to load relay config")?;

    if let Some(session) = &args.session {
        config.session = session.clone();
    }
    if let Some(path) = &args.audit_log {
        config.audit_log = Some(path.clone());
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Stdout transport
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OutboundLine<'a> {
    subject: &'static str,
    connection: ConnectionId,
    envelope: &'a ChatEnvelope<ChatUpdate>,
}

struct StdoutSink;

impl ConnectionSink for StdoutSink {
    fn send(&self, connection: ConnectionId, envelope: &ChatEnvelope<ChatUpdate>) {
        let line = OutboundLine {
            subject: subjects::CHAT_UPDATE,
            connection,
            envelope,
        };
        match serde_json::to_string(&line) {
            Ok(json) => {
                let mut out = std::io::stdout().lock();
                if let Err(e) = writeln!(out, "{}", json) {
                    log::warn!("Failed to write send for {}: {}", connection, e);
                }
            }
            Err(e) => log::warn!("Failed to serialise send for {}: {}", connection, e),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the outbound sends.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("janet_chat=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;
    let world = Arc::new(World::from_scenario(scenario).context("Invalid scenario")?);

    log::info!(
        "Starting janet-chat-relay (session='{}', participants={}, blockers={})",
        config.session,
        world.participant_count(),
        world.blocker_count(),
    );

    let mut audit_sinks: Vec<Box<dyn AuditSink>> = vec![Box::new(LogAuditSink)];
    if let Some(path) = &config.audit_log {
        let sink = FileAuditSink::open(path)
            .with_context(|| format!("Failed to open audit log {}", path.display()))?;
        audit_sinks.push(Box::new(sink));
    }

    let relay = ServerRelay::new(config, world, Arc::new(StdoutSink))
        .with_audit_sink(Arc::new(TeeAuditSink::new(audit_sinks)));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());

    tokio::select! {
        summary = run_feed(stdin, &relay) => {
            let summary = summary.context("Event feed failed")?;
            log::info!(
                "Feed closed: {} lines, {} dispatched, {} rejected",
                summary.lines, summary.dispatched, summary.rejected
            );
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("janet-chat-relay shutting down (SIGINT)");
        }
    }

    let stats = relay.stats();
    log::info!(
        "Relay stats: {} dispatched, {} sends, {} agent deliveries, {} audit lines",
        stats.dispatched,
        stats.sends,
        stats.agent_deliveries,
        stats.audit_lines
    );
    Ok(())
}
