//! Errors for the fallible edges of the crate: loading config and scenario
//! files, writing the audit file, decoding fed events.
//!
//! Dispatch and receive never fail; see [`crate::relay`].

use crate::channel::UnknownChannel;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<UnknownChannel> for ChatError {
    fn from(e: UnknownChannel) -> Self {
        Self::Parse(e.to_string())
    }
}

#[cfg(feature = "server")]
impl From<config::ConfigError> for ChatError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
