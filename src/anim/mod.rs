//! Animation state machines: viseme application and autonomous blinking.

pub mod blink;
pub mod state;

pub use blink::{BlinkConfig, BlinkMachine, BlinkPhase, EyeState};
pub use state::AnimationState;
