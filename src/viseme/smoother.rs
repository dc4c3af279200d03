//! Temporal hysteresis over viseme categories.
//!
//! A raw per-frame classification flaps: one noisy frame and the mouth
//! visibly flickers. The smoother requires a differing candidate to persist
//! for a number of consecutive calls scaled by the smoothing strength before
//! accepting it, re-emitting the previous category until then. Deterministic
//! dwell was chosen over the probabilistic accept/reject it stands in for;
//! the documented extremes hold exactly (0 = instant, 1 = locked).

use crate::classify::phoneme::PhonemeEvent;
use crate::defaults;
use crate::viseme::category::{VisemeCategory, map_label};
use std::collections::VecDeque;

/// Hysteresis filter between the label mapper and the animation state.
#[derive(Debug)]
pub struct VisemeSmoother {
    history: VecDeque<VisemeCategory>,
    history_cap: usize,
    strength: f32,
    pending: Option<VisemeCategory>,
    pending_streak: u32,
}

impl VisemeSmoother {
    /// Creates a smoother with the given strength, clamped to [0.0, 1.0].
    pub fn new(strength: f32) -> Self {
        Self {
            history: VecDeque::with_capacity(defaults::SMOOTHING_HISTORY_LEN),
            history_cap: defaults::SMOOTHING_HISTORY_LEN,
            strength: strength.clamp(0.0, 1.0),
            pending: None,
            pending_streak: 0,
        }
    }

    /// Overrides the history capacity (minimum 1).
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap.max(1);
        self
    }

    /// Maps an optional phoneme event to the category to display.
    ///
    /// Absent and rest events resolve to `Idle`; other labels go through the
    /// fixed mapping table; the result is then gated by the dwell rule and
    /// the emitted category is appended to the bounded history.
    pub fn resolve(&mut self, event: Option<&PhonemeEvent>) -> VisemeCategory {
        let candidate = match event {
            None => VisemeCategory::Idle,
            Some(e) if e.is_rest() => VisemeCategory::Idle,
            Some(e) => map_label(&e.label),
        };

        let emitted = self.gate(candidate);
        self.record(emitted);
        emitted
    }

    /// Applies the dwell rule: how many consecutive calls a differing
    /// candidate must persist before it is accepted.
    fn gate(&mut self, candidate: VisemeCategory) -> VisemeCategory {
        let Some(&previous) = self.history.back() else {
            // First call: nothing to compare against, accept outright.
            return candidate;
        };

        if candidate == previous {
            self.pending = None;
            self.pending_streak = 0;
            return candidate;
        }

        let Some(required) = self.required_streak() else {
            // Strength 1.0: locked to the first emission forever.
            return previous;
        };

        if self.pending == Some(candidate) {
            self.pending_streak += 1;
        } else {
            self.pending = Some(candidate);
            self.pending_streak = 1;
        }

        if self.pending_streak >= required {
            self.pending = None;
            self.pending_streak = 0;
            candidate
        } else {
            previous
        }
    }

    /// Required consecutive observations for a switch, or `None` when the
    /// category is locked (strength 1.0).
    fn required_streak(&self) -> Option<u32> {
        if self.strength >= 1.0 {
            None
        } else if self.strength <= 0.0 {
            Some(1)
        } else {
            Some(1 + (self.strength * defaults::DWELL_SPAN).round() as u32)
        }
    }

    fn record(&mut self, category: VisemeCategory) {
        self.history.push_back(category);
        while self.history.len() > self.history_cap {
            self.history.pop_front();
        }
    }

    /// Current smoothing strength.
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Updates the smoothing strength, clamped to [0.0, 1.0].
    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength.clamp(0.0, 1.0);
    }

    /// Recently emitted categories, oldest first.
    pub fn history(&self) -> Vec<VisemeCategory> {
        self.history.iter().copied().collect()
    }

    /// Clears the history and any pending transition.
    pub fn reset(&mut self) {
        self.history.clear();
        self.pending = None;
        self.pending_streak = 0;
    }
}

impl Default for VisemeSmoother {
    fn default() -> Self {
        Self::new(defaults::SMOOTHING_STRENGTH)
    }
}
