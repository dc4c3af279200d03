//! Autonomous blink state machine.
//!
//! Entirely independent of audio: the eyes keep blinking whether or not the
//! microphone is delivering frames. Explicit state and enumerated
//! transitions so the timing invariants are directly checkable.

use crate::defaults;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Phase of the blink cycle.
///
/// Closing is a timed hold of the closed-eye sprite, not a multi-frame
/// animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    /// Eyes open, accumulating time toward the next deadline.
    Open,
    /// Closed-eye sprite displayed until the hold elapses.
    Closing,
}

/// Displayed eye state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeState {
    Open,
    Closed,
}

impl EyeState {
    /// Sprite key the renderer selects within the eyes layer.
    pub fn sprite_key(&self) -> &'static str {
        match self {
            EyeState::Open => "eyes_open",
            EyeState::Closed => "eyes_closed",
        }
    }
}

/// Which control path drives the eyes.
///
/// Exactly one is active at a time: entering manual mode zeroes the
/// autonomous timers so a stale deadline cannot fire right after release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlinkMode {
    Auto,
    Forced(EyeState),
}

/// Configuration for the blink machine.
#[derive(Debug, Clone)]
pub struct BlinkConfig {
    /// Range the next-blink deadline is drawn from, uniformly.
    pub interval: RangeInclusive<Duration>,
    /// How long the closed-eye sprite is held.
    pub hold: Duration,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            interval: defaults::BLINK_MIN_INTERVAL..=defaults::BLINK_MAX_INTERVAL,
            hold: defaults::BLINK_HOLD,
        }
    }
}

/// Blink state machine advanced once per render tick.
#[derive(Debug)]
pub struct BlinkMachine {
    config: BlinkConfig,
    phase: BlinkPhase,
    mode: BlinkMode,
    time_since_blink: Duration,
    hold_elapsed: Duration,
    next_deadline: Duration,
    rng: StdRng,
}

impl BlinkMachine {
    /// Creates a machine in the Open phase with a freshly drawn deadline.
    pub fn new(config: BlinkConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates a machine with a seeded RNG for deterministic tests.
    pub fn with_seed(config: BlinkConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: BlinkConfig, mut rng: StdRng) -> Self {
        let next_deadline = draw_deadline(&mut rng, &config.interval);
        Self {
            config,
            phase: BlinkPhase::Open,
            mode: BlinkMode::Auto,
            time_since_blink: Duration::ZERO,
            hold_elapsed: Duration::ZERO,
            next_deadline,
            rng,
        }
    }

    /// Advances the machine by the tick's elapsed time.
    pub fn advance(&mut self, delta: Duration) {
        if let BlinkMode::Forced(_) = self.mode {
            // Manual mode: the autonomous timers stay zeroed.
            return;
        }

        match self.phase {
            BlinkPhase::Open => {
                self.time_since_blink += delta;
                if self.time_since_blink >= self.next_deadline {
                    self.phase = BlinkPhase::Closing;
                    self.hold_elapsed = Duration::ZERO;
                }
            }
            BlinkPhase::Closing => {
                self.hold_elapsed += delta;
                if self.hold_elapsed >= self.config.hold {
                    self.rearm();
                }
            }
        }
    }

    /// Forces an immediate blink from any phase and returns control to the
    /// autonomous timer once it completes.
    pub fn trigger_blink(&mut self) {
        self.mode = BlinkMode::Auto;
        self.phase = BlinkPhase::Closing;
        self.hold_elapsed = Duration::ZERO;
    }

    /// Pins the eye to the requested state and suspends the autonomous
    /// timer until `trigger_blink` or `release_forced`.
    pub fn set_forced(&mut self, state: EyeState) {
        self.mode = BlinkMode::Forced(state);
        self.time_since_blink = Duration::ZERO;
        self.hold_elapsed = Duration::ZERO;
    }

    /// Returns to autonomous blinking with a fresh deadline.
    pub fn release_forced(&mut self) {
        if self.mode != BlinkMode::Auto {
            self.mode = BlinkMode::Auto;
            self.rearm();
        }
    }

    fn rearm(&mut self) {
        self.phase = BlinkPhase::Open;
        self.time_since_blink = Duration::ZERO;
        self.hold_elapsed = Duration::ZERO;
        self.next_deadline = draw_deadline(&mut self.rng, &self.config.interval);
    }

    /// Eye state to display this tick.
    pub fn eye_state(&self) -> EyeState {
        match self.mode {
            BlinkMode::Forced(state) => state,
            BlinkMode::Auto => match self.phase {
                BlinkPhase::Open => EyeState::Open,
                BlinkPhase::Closing => EyeState::Closed,
            },
        }
    }

    /// Current phase of the autonomous cycle.
    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    /// True while a manual override is pinning the eye.
    pub fn is_forced(&self) -> bool {
        matches!(self.mode, BlinkMode::Forced(_))
    }

    /// Deadline the Open phase is counting toward.
    pub fn next_deadline(&self) -> Duration {
        self.next_deadline
    }
}

impl Default for BlinkMachine {
    fn default() -> Self {
        Self::new(BlinkConfig::default())
    }
}

fn draw_deadline(rng: &mut StdRng, interval: &RangeInclusive<Duration>) -> Duration {
    let min = interval.start().as_millis() as u64;
    let max = interval.end().as_millis() as u64;
    if min >= max {
        return *interval.start();
    }
    Duration::from_millis(rng.random_range(min..=max))
}
