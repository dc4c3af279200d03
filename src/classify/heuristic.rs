//! Signal-heuristic fallback classifier.
//!
//! Keeps the pipeline operable when no recognition model is available. Looks
//! at two cheap features per frame: RMS energy (is anyone speaking, and how
//! loudly) and zero-crossing rate (a coarse split between low-frequency
//! voiced sounds and high-frequency fricatives). Intentionally approximate.

use crate::audio::frame::AudioFrame;
use crate::classify::classifier::PhonemeClassifier;
use crate::classify::phoneme::{PhonemeEvent, labels};
use crate::defaults;
use crate::error::Result;
use std::time::Duration;

/// Calculates the Root Mean Square (RMS) of normalized samples.
///
/// Returns 0.0 for silence, ~0.707 for a full-scale sine wave, 1.0 for a
/// full-scale square wave.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Fraction of adjacent sample pairs whose signs differ, in [0.0, 1.0].
///
/// High-frequency content (fricatives like F/S) crosses zero far more often
/// than voiced vowels, which makes this a serviceable stand-in for a real
/// low/high band-energy split.
pub fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }

    let crossings = samples
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}

/// Heuristic phoneme classifier operating on per-frame energy features.
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    silence_threshold: f32,
    fricative_zcr: f32,
    vowel_zcr: f32,
}

impl HeuristicClassifier {
    /// Creates a classifier with the default thresholds.
    pub fn new() -> Self {
        Self {
            silence_threshold: defaults::SILENCE_RMS_THRESHOLD,
            fricative_zcr: defaults::FRICATIVE_ZCR_THRESHOLD,
            vowel_zcr: defaults::VOWEL_ZCR_THRESHOLD,
        }
    }

    /// Overrides the silence threshold.
    pub fn with_silence_threshold(mut self, threshold: f32) -> Self {
        self.silence_threshold = threshold;
        self
    }

    /// Picks a vowel label by loudness bucket.
    ///
    /// Crude, but it varies the mouth shape with intensity instead of
    /// pinning every vowel to the same sprite.
    fn vowel_label(rms: f32) -> &'static str {
        if rms > 0.25 {
            labels::A
        } else if rms > 0.12 {
            labels::O
        } else if rms > 0.06 {
            labels::E
        } else {
            labels::U
        }
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PhonemeClassifier for HeuristicClassifier {
    fn classify(&self, frame: &AudioFrame) -> Result<Vec<PhonemeEvent>> {
        let duration = Duration::from_millis(frame.duration_ms() as u64);
        let rms = calculate_rms(&frame.samples);

        if rms < self.silence_threshold {
            return Ok(vec![PhonemeEvent::spanning(labels::REST, duration)]);
        }

        let zcr = zero_crossing_rate(&frame.samples);
        let label = if zcr > self.fricative_zcr {
            labels::F
        } else if zcr < self.vowel_zcr {
            Self::vowel_label(rms)
        } else {
            labels::M
        };

        Ok(vec![PhonemeEvent::spanning(label, duration)])
    }

    fn name(&self) -> &str {
        "heuristic"
    }

    fn is_fallback(&self) -> bool {
        true
    }
}
