//! vismic - Microphone-driven viseme and blink animation
//!
//! Turns live microphone audio into sprite-swap commands for a layered
//! 2D character: mouth shapes follow classified phonemes through a
//! temporal smoother, eyes blink on their own schedule.

// Errors propagate; panicking paths are confined to tests.
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod anim;
pub mod audio;
pub mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod clock;
pub mod config;
pub mod defaults;
pub mod driver;
pub mod error;
pub mod render;
pub mod viseme;

// Core traits (source → process → sink)
pub use audio::{AudioFrame, CaptureSource, FrameBuffer};
pub use classify::{PhonemeClassifier, PhonemeEvent, init_classifier};
pub use render::{SpriteLayer, SpriteSurface};

// Pipeline
pub use driver::{Pipeline, PipelineConfig, PipelineDriver, PipelineHandle, Snapshot};

// Animation
pub use anim::{AnimationState, BlinkConfig, BlinkMachine, BlinkPhase, EyeState};
pub use viseme::{VisemeCategory, VisemeSmoother, map_label};

// Error handling
pub use error::{Result, VismicError};

// Config
pub use config::Config;

/// Build version string from the crate manifest.
pub fn version_string() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
