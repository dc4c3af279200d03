//! Audio capture and frame buffering.

pub mod capture;
pub mod frame;
pub mod frame_buffer;

pub use capture::{CaptureSource, MockCaptureSource};
#[cfg(feature = "cpal-audio")]
pub use capture::{CpalCaptureSource, list_devices};
pub use frame::AudioFrame;
pub use frame_buffer::FrameBuffer;
