//! Line-fed driver: one JSON [`ChatEvent`] per line in, one dispatch out.
//!
//! Used by the relay binary to accept events from the game process over
//! stdin (or any other byte stream). A malformed line is logged and
//! skipped; the feed only stops at end of input or on an I/O error.

use crate::error::Result;
use crate::event::ChatEvent;
use crate::relay::ServerRelay;
use log::warn;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub lines: u64,
    pub dispatched: u64,
    pub rejected: u64,
}

pub async fn run_feed<R>(reader: R, relay: &ServerRelay) -> Result<FeedSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut summary = FeedSummary::default();

    while let Some(line) = lines.next_line().await? {
        summary.lines += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let _span = tracing::debug_span!("feed_line", line = summary.lines).entered();
        match serde_json::from_str::<ChatEvent>(line) {
            Ok(event) => {
                relay.dispatch(&event);
                summary.dispatched += 1;
            }
            Err(e) => {
                warn!("Rejected feed line {}: {}", summary.lines, e);
                summary.rejected += 1;
            }
        }
    }

    Ok(summary)
}
