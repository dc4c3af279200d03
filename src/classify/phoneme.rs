//! Phoneme event type and the fixed label alphabet.

use std::time::Duration;

/// Labels the classifiers emit.
///
/// The viseme mapper treats anything outside this alphabet as a safe
/// closed-mouth default, so the alphabet is advisory rather than enforced.
pub mod labels {
    /// Silence / rest.
    pub const REST: &str = "sil";
    /// Open vowels.
    pub const A: &str = "a";
    pub const E: &str = "e";
    pub const O: &str = "o";
    pub const U: &str = "u";
    /// Closed consonants (lips together).
    pub const M: &str = "m";
    /// Teeth-visible consonants.
    pub const F: &str = "f";
}

/// A single classified phoneme within a frame.
///
/// Ephemeral: produced per classification call and consumed immediately by
/// the viseme mapper, never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonemeEvent {
    /// Label from the classifier's alphabet.
    pub label: String,
    /// Offset of the phoneme from the start of the frame.
    pub start_offset: Duration,
    /// How long the phoneme spans within the frame.
    pub duration: Duration,
}

impl PhonemeEvent {
    /// Creates an event covering a whole frame of the given duration.
    pub fn spanning(label: &str, duration: Duration) -> Self {
        Self {
            label: label.to_string(),
            start_offset: Duration::ZERO,
            duration,
        }
    }

    /// Returns true when the label denotes silence/rest.
    pub fn is_rest(&self) -> bool {
        let lower = self.label.to_lowercase();
        lower == labels::REST || lower == "rest" || lower.is_empty()
    }
}
