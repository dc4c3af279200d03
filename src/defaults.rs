//! Default configuration constants for vismic.
//!
//! Shared constants used across configuration types to keep the capture,
//! classification and animation stages in agreement.

use std::time::Duration;

/// Default audio sample rate in Hz.
///
/// 16kHz is plenty for the energy/zero-crossing features the classifiers
/// look at, and matches what most speech engines expect.
pub const SAMPLE_RATE: u32 = 16000;

/// Default frame length in milliseconds.
///
/// The capture callback slices the incoming stream into frames of this
/// length. 50ms lines up with the classification throttle so at most one
/// fresh frame is waiting per eligible classify call.
pub const FRAME_MS: u32 = 50;

/// Default frame buffer capacity in frames.
///
/// 20 frames of 50ms ≈ 1 second of audio. The buffer drops the oldest frame
/// on overflow: bounded staleness matters more than completeness for lip
/// sync.
pub const FRAME_BUFFER_CAPACITY: usize = 20;

/// Minimum interval between two classification calls.
///
/// The render loop runs at ~60Hz but classifying every tick buys nothing
/// visually; 50ms keeps mouth updates at 20Hz and leaves headroom in the
/// tick budget.
pub const CLASSIFY_INTERVAL: Duration = Duration::from_millis(50);

/// Render loop tick interval (~60Hz).
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// RMS threshold below which a frame counts as silence (0.0 to 1.0).
///
/// Tuned for typical microphone input levels; the same value the voice
/// activity threshold of comparable capture pipelines uses.
pub const SILENCE_RMS_THRESHOLD: f32 = 0.02;

/// Zero-crossing rate above which a frame reads as a fricative
/// (teeth-visible consonant).
pub const FRICATIVE_ZCR_THRESHOLD: f32 = 0.30;

/// Zero-crossing rate below which a voiced frame reads as a vowel.
pub const VOWEL_ZCR_THRESHOLD: f32 = 0.12;

/// Default smoothing strength in [0.0, 1.0].
///
/// 0.0 accepts every category change immediately, 1.0 never switches after
/// the first emission. 0.7 suppresses single-frame spikes while keeping
/// transitions within ~3 classify calls (~150ms) of the real change.
pub const SMOOTHING_STRENGTH: f32 = 0.7;

/// Maximum length of the smoothing history.
pub const SMOOTHING_HISTORY_LEN: usize = 10;

/// Dwell span in classify calls that smoothing strength scales over.
///
/// At strength s in (0, 1) a differing candidate must persist for
/// `1 + round(s * DWELL_SPAN)` consecutive calls before it is accepted.
pub const DWELL_SPAN: f32 = 4.0;

/// Lower bound of the autonomous blink interval.
pub const BLINK_MIN_INTERVAL: Duration = Duration::from_millis(2000);

/// Upper bound of the autonomous blink interval.
pub const BLINK_MAX_INTERVAL: Duration = Duration::from_millis(5000);

/// How long the closed-eye sprite is held during a blink.
pub const BLINK_HOLD: Duration = Duration::from_millis(150);
