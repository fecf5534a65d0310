//! Speech extraction for client-side text-to-speech.
//!
//! Spoken lines are rendered as `<speaker> says,<SAYS_CHAR>"<speech>"`.
//! Only what follows the first [`SAYS_CHAR`] is ever handed to the
//! synthesis engine.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Non-printing separator placed right before the spoken part of a line.
/// U+200A HAIR SPACE.
pub const SAYS_CHAR: char = '\u{200A}';

static STYLE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The external text-to-speech engine.
pub trait SpeechSynth: Send + Sync {
    fn synthesize(&self, text: &str);
}

/// Read-only view of the user's "text-to-speech enabled" setting.
pub trait TtsToggle: Send + Sync {
    fn tts_enabled(&self) -> bool;
}

impl TtsToggle for AtomicBool {
    fn tts_enabled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Remove inline style tags (`<b>`, `</color>`, …).
pub fn strip_markup(text: &str) -> std::borrow::Cow<'_, str> {
    STYLE_TAG.replace_all(text, "")
}

/// Derive the spoken substring of `text`, if there is one.
///
/// Returns `None` when the marker is absent, or when nothing alphabetic
/// follows it.
pub fn extract_speech(text: &str) -> Option<String> {
    let stripped = strip_markup(text);
    let (_, spoken) = stripped.split_once(SAYS_CHAR)?;
    if spoken.is_empty() || !spoken.chars().any(char::is_alphabetic) {
        return None;
    }
    Some(spoken.to_string())
}

pub struct SpeechExtractor {
    toggle: Arc<dyn TtsToggle>,
    synth: Arc<dyn SpeechSynth>,
}

impl SpeechExtractor {
    pub fn new(toggle: Arc<dyn TtsToggle>, synth: Arc<dyn SpeechSynth>) -> Self {
        Self { toggle, synth }
    }

    /// Hand the spoken part of `text` to the engine when speech is enabled.
    ///
    /// Returns the substring that was synthesised.
    pub fn maybe_synthesize(&self, text: &str) -> Option<String> {
        if !self.toggle.tts_enabled() {
            return None;
        }
        let spoken = extract_speech(text)?;
        log::trace!("Synthesising {} chars of speech", spoken.len());
        self.synth.synthesize(&spoken);
        Some(spoken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_before_looking_for_marker() {
        let line = format!("<b>Shadow</b> says,{SAYS_CHAR}<i>\"hello\"</i>");
        assert_eq!(extract_speech(&line).as_deref(), Some("\"hello\""));
    }

    #[test]
    fn only_first_marker_splits() {
        let line = format!("a{SAYS_CHAR}b{SAYS_CHAR}c");
        assert_eq!(extract_speech(&line), Some(format!("b{SAYS_CHAR}c")));
    }

    #[test]
    fn punctuation_only_is_not_speech() {
        assert_eq!(extract_speech(&format!("x{SAYS_CHAR}?!...")), None);
        assert_eq!(extract_speech(&format!("x{SAYS_CHAR}")), None);
        assert_eq!(extract_speech("no marker here"), None);
    }
}
