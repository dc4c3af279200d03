//! Audio frame type shared between the capture and render domains.

use std::time::Instant;

/// A fixed-size chunk of captured audio with metadata.
///
/// Produced by the capture callback, consumed exactly once by the pipeline
/// driver, never mutated after creation.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Sequence number for ordering frames.
    pub sequence: u64,
    /// Mono samples, normalized to [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate the frame was captured at, in Hz.
    pub sample_rate: u32,
    /// Timestamp when the audio was captured.
    pub captured_at: Instant,
}

impl AudioFrame {
    /// Creates a new audio frame captured now.
    pub fn new(sequence: u64, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            sequence,
            samples,
            sample_rate,
            captured_at: Instant::now(),
        }
    }

    /// Returns the duration of this frame in milliseconds.
    pub fn duration_ms(&self) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u32 * 1000) / self.sample_rate
    }
}
