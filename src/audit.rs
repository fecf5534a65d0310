//! Admin-console audit trail.
//!
//! One line per dispatched event, regardless of how many recipients it
//! reached. Sinks must never block delivery: write failures are logged and
//! dropped.

use crate::channel::ChannelSet;
use crate::error::Result;
use crate::event::ChatEvent;
use log::{info, warn};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

pub trait AuditSink: Send + Sync {
    fn append(&self, line: &str);
}

/// Format the audit line for `event`.
///
/// Channels outside the unlabeled set get a bold bracketed label, e.g.
/// `<b>[Common]</b> Bob says, "hi"`.
pub fn format_audit_line(event: &ChatEvent) -> String {
    let channels = event.channels();
    if channels.is_subset_of(ChannelSet::UNLABELED) {
        event.text().to_string()
    } else {
        format!("<b>[{}]</b> {}", channels, event.text())
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Writes audit lines to the `audit` log target.
#[derive(Debug, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn append(&self, line: &str) {
        info!(target: "audit", "{}", line);
    }
}

/// Appends audit lines to a file, one per line.
pub struct FileAuditSink {
    file: Mutex<File>,
}

impl FileAuditSink {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn append(&self, line: &str) {
        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "{}", line) {
            warn!("Failed to write audit line: {}", e);
        }
    }
}

/// Fan one line out to several sinks.
pub struct TeeAuditSink {
    sinks: Vec<Box<dyn AuditSink>>,
}

impl TeeAuditSink {
    pub fn new(sinks: Vec<Box<dyn AuditSink>>) -> Self {
        Self { sinks }
    }
}

impl AuditSink for TeeAuditSink {
    fn append(&self, line: &str) {
        for sink in &self.sinks {
            sink.append(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlabeled_channels_have_no_prefix() {
        let ev = ChatEvent::builder("Bob says, hi", ChannelSet::LOCAL | ChannelSet::SYSTEM).build();
        assert_eq!(format_audit_line(&ev), "Bob says, hi");
    }

    #[test]
    fn labeled_channels_get_bold_prefix() {
        let ev = ChatEvent::builder("Bob says, hi", ChannelSet::LOCAL | ChannelSet::COMMON).build();
        assert_eq!(format_audit_line(&ev), "<b>[Common, Local]</b> Bob says, hi");
    }

    #[test]
    fn empty_channel_set_is_unlabeled() {
        let ev = ChatEvent::builder("nothing", ChannelSet::NONE).build();
        assert_eq!(format_audit_line(&ev), "nothing");
    }
}
