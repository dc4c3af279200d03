//! Animation state: current viseme plus the blink machine.
//!
//! Single-writer: only the pipeline driver mutates this, once per render
//! tick. Renderer signals go out exactly once per actual change on either
//! layer.

use crate::anim::blink::{BlinkConfig, BlinkMachine, EyeState};
use crate::render::{SpriteLayer, SpriteSurface};
use crate::viseme::category::VisemeCategory;
use std::time::Duration;

/// Mutable animation state for one character.
#[derive(Debug)]
pub struct AnimationState {
    current_viseme: VisemeCategory,
    blink: BlinkMachine,
    displayed_eyes: Option<EyeState>,
    viseme_signalled: bool,
}

impl AnimationState {
    /// Creates the state a pipeline starts with: Idle mouth, open eyes.
    pub fn new(blink_config: BlinkConfig) -> Self {
        Self {
            current_viseme: VisemeCategory::Idle,
            blink: BlinkMachine::new(blink_config),
            displayed_eyes: None,
            viseme_signalled: false,
        }
    }

    /// Replaces the blink machine (seeded machines in tests).
    pub fn with_blink_machine(mut self, blink: BlinkMachine) -> Self {
        self.blink = blink;
        self
    }

    /// Applies a viseme category, signalling the surface only on change.
    ///
    /// Idempotent: re-applying the current category does nothing, so the
    /// renderer is free to treat every signal as a real transition.
    pub fn apply_viseme(&mut self, category: VisemeCategory, surface: &mut dyn SpriteSurface) {
        if self.viseme_signalled && category == self.current_viseme {
            return;
        }
        self.current_viseme = category;
        self.viseme_signalled = true;
        surface.set_visible_sprite(SpriteLayer::Mouth, category.sprite_key());
    }

    /// Advances the blink machine and signals the eye layer on change.
    pub fn tick_blink(&mut self, delta: Duration, surface: &mut dyn SpriteSurface) {
        self.blink.advance(delta);
        let state = self.blink.eye_state();
        if self.displayed_eyes != Some(state) {
            self.displayed_eyes = Some(state);
            surface.set_visible_sprite(SpriteLayer::Eyes, state.sprite_key());
        }
    }

    /// Currently displayed viseme.
    pub fn current_viseme(&self) -> VisemeCategory {
        self.current_viseme
    }

    /// Access to the blink machine for the control surface.
    pub fn blink(&self) -> &BlinkMachine {
        &self.blink
    }

    /// Mutable access to the blink machine for the control surface.
    pub fn blink_mut(&mut self) -> &mut BlinkMachine {
        &mut self.blink
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new(BlinkConfig::default())
    }
}
