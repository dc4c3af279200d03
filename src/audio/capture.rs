//! Audio capture sources feeding the frame buffer.
//!
//! The capture side runs on the audio hardware's clock and communicates with
//! the render loop only through the [`FrameBuffer`]. The real implementation
//! uses CPAL; a mock is provided for tests.

use crate::audio::frame_buffer::FrameBuffer;
use crate::error::Result;

/// Trait for audio capture sources.
///
/// Allows swapping implementations (real microphone vs mock). `start` hands
/// the source the frame buffer it must produce into; frames arrive on the
/// source's own schedule until `stop`.
pub trait CaptureSource: Send {
    /// Starts capturing into the given frame buffer.
    fn start(&mut self, sink: FrameBuffer) -> Result<()>;

    /// Stops capturing. Idempotent.
    fn stop(&mut self) -> Result<()>;

    /// Effective sample rate of produced frames, in Hz.
    fn sample_rate(&self) -> u32;
}

/// Mock capture source for testing.
#[derive(Debug, Clone)]
pub struct MockCaptureSource {
    sample_rate: u32,
    frames: Vec<Vec<f32>>,
    is_started: bool,
    should_fail_start: bool,
    error_message: String,
}

impl MockCaptureSource {
    /// Creates a new mock capture source with default settings.
    pub fn new() -> Self {
        Self {
            sample_rate: crate::defaults::SAMPLE_RATE,
            frames: Vec::new(),
            is_started: false,
            should_fail_start: false,
            error_message: "mock capture error".to_string(),
        }
    }

    /// Configure sample batches pushed into the sink when `start` is called.
    pub fn with_frames(mut self, frames: Vec<Vec<f32>>) -> Self {
        self.frames = frames;
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the error message for failures.
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the source is started.
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl Default for MockCaptureSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for MockCaptureSource {
    fn start(&mut self, sink: FrameBuffer) -> Result<()> {
        if self.should_fail_start {
            return Err(crate::error::VismicError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        self.is_started = true;
        for (sequence, samples) in self.frames.iter().enumerate() {
            sink.push(crate::audio::frame::AudioFrame::new(
                sequence as u64,
                samples.clone(),
                self.sample_rate,
            ));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(feature = "cpal-audio")]
pub use cpal_impl::{CpalCaptureSource, list_devices};

#[cfg(feature = "cpal-audio")]
mod cpal_impl {
    use super::CaptureSource;
    use crate::audio::frame::AudioFrame;
    use crate::audio::frame_buffer::FrameBuffer;
    use crate::error::{Result, VismicError};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Run a closure with stderr temporarily redirected to /dev/null.
    ///
    /// Suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers while
    /// probing audio backends. Harmless but confusing in an overlay's log.
    ///
    /// # Safety
    /// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2.
    /// Safe as long as no other thread is concurrently manipulating fd 2.
    fn with_suppressed_stderr<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        unsafe {
            let saved_fd = libc::dup(2);
            let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
            if saved_fd >= 0 && devnull >= 0 {
                libc::dup2(devnull, 2);
                libc::close(devnull);
            }

            let result = f();

            if saved_fd >= 0 {
                libc::dup2(saved_fd, 2);
                libc::close(saved_fd);
            }

            result
        }
    }

    /// Device names preferred on PipeWire/PulseAudio desktops.
    const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "PulseAudio"];

    /// Device name patterns that are never useful as a voice input.
    const FILTERED_PATTERNS: &[&str] = &["surround", "hdmi", "s/pdif", "digital output"];

    fn is_preferred_device(name: &str) -> bool {
        let lower = name.to_lowercase();
        PREFERRED_DEVICES
            .iter()
            .any(|pref| lower.contains(&pref.to_lowercase()))
    }

    fn should_filter_device(name: &str) -> bool {
        let lower = name.to_lowercase();
        FILTERED_PATTERNS.iter().any(|pat| lower.contains(pat))
    }

    /// List available input devices, preferred ones first.
    ///
    /// # Errors
    /// Returns `VismicError::AudioCapture` if device enumeration fails.
    pub fn list_devices() -> Result<Vec<String>> {
        let devices = with_suppressed_stderr(|| {
            cpal::default_host()
                .input_devices()
                .map(|iter| iter.collect::<Vec<_>>())
        })
        .map_err(|e| VismicError::AudioCapture {
            message: format!("Failed to enumerate input devices: {}", e),
        })?;

        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                if should_filter_device(&name) {
                    continue;
                }
                if is_preferred_device(&name) {
                    names.insert(0, format!("{} [recommended]", name));
                } else {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    fn find_device(device_name: Option<&str>) -> Result<cpal::Device> {
        with_suppressed_stderr(|| {
            let host = cpal::default_host();

            if let Some(wanted) = device_name {
                let devices = host.input_devices().map_err(|e| VismicError::AudioCapture {
                    message: format!("Failed to enumerate input devices: {}", e),
                })?;
                for device in devices {
                    if device.name().is_ok_and(|n| n == wanted) {
                        return Ok(device);
                    }
                }
                return Err(VismicError::AudioDeviceNotFound {
                    device: wanted.to_string(),
                });
            }

            // No explicit device: prefer PipeWire/Pulse so the desktop's
            // input selection is respected, then fall back to the default.
            if let Ok(devices) = host.input_devices() {
                for device in devices {
                    if device.name().is_ok_and(|n| is_preferred_device(&n)) {
                        return Ok(device);
                    }
                }
            }

            host.default_input_device()
                .ok_or_else(|| VismicError::AudioDeviceNotFound {
                    device: "default".to_string(),
                })
        })
    }

    /// Wrapper for cpal::Stream to make it Send.
    ///
    /// SAFETY: the stream is only touched under the Mutex in
    /// `CpalCaptureSource`, so it is never accessed from two threads at once.
    struct SendableStream(cpal::Stream);

    unsafe impl Send for SendableStream {}

    /// Accumulates interleaved input samples and emits fixed-size mono frames.
    struct FrameSlicer {
        sink: FrameBuffer,
        pending: Vec<f32>,
        frame_samples: usize,
        channels: usize,
        sample_rate: u32,
        sequence: Arc<AtomicU64>,
    }

    impl FrameSlicer {
        fn consume(&mut self, interleaved: &[f32]) {
            if self.channels <= 1 {
                self.pending.extend_from_slice(interleaved);
            } else {
                // Mix down to mono by averaging channels.
                for chunk in interleaved.chunks(self.channels) {
                    let sum: f32 = chunk.iter().sum();
                    self.pending.push(sum / chunk.len() as f32);
                }
            }

            while self.pending.len() >= self.frame_samples {
                let rest = self.pending.split_off(self.frame_samples);
                let samples = std::mem::replace(&mut self.pending, rest);
                let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
                self.sink
                    .push(AudioFrame::new(seq, samples, self.sample_rate));
            }
        }
    }

    /// Real microphone capture using CPAL.
    ///
    /// The stream callback slices incoming audio into frames of
    /// `frame_ms` length and pushes them into the frame buffer at hardware
    /// cadence. Uses the device's native sample rate; frames carry the
    /// effective rate so the classifier does not have to assume one.
    pub struct CpalCaptureSource {
        device: cpal::Device,
        stream: Mutex<Option<SendableStream>>,
        sample_rate: u32,
        channels: usize,
        sample_format: cpal::SampleFormat,
        config: cpal::StreamConfig,
        frame_ms: u32,
        sequence: Arc<AtomicU64>,
    }

    impl CpalCaptureSource {
        /// Create a capture source for the named device (or the best default).
        ///
        /// # Errors
        /// Returns an error when the device cannot be found or has no usable
        /// input configuration.
        pub fn new(device_name: Option<&str>, frame_ms: u32) -> Result<Self> {
            let device = find_device(device_name)?;

            let supported = device
                .default_input_config()
                .map_err(|e| map_config_error(&device, e))?;

            let sample_rate = supported.sample_rate().0;
            let channels = supported.channels() as usize;
            let sample_format = supported.sample_format();
            let config: cpal::StreamConfig = supported.into();

            Ok(Self {
                device,
                stream: Mutex::new(None),
                sample_rate,
                channels,
                sample_format,
                config,
                frame_ms: frame_ms.max(1),
                sequence: Arc::new(AtomicU64::new(0)),
            })
        }

        /// Name of the underlying device, if it has one.
        pub fn device_name(&self) -> Option<String> {
            self.device.name().ok()
        }

        fn build_stream(&self, sink: FrameBuffer) -> Result<cpal::Stream> {
            let frame_samples =
                (self.sample_rate as usize * self.frame_ms as usize / 1000).max(1);
            let mut slicer = FrameSlicer {
                sink,
                pending: Vec::with_capacity(frame_samples * 2),
                frame_samples,
                channels: self.channels,
                sample_rate: self.sample_rate,
                sequence: self.sequence.clone(),
            };

            let err_fn = |e: cpal::StreamError| {
                eprintln!("vismic: audio stream error: {}", e);
            };

            let stream = match self.sample_format {
                cpal::SampleFormat::F32 => self.device.build_input_stream(
                    &self.config,
                    move |data: &[f32], _| slicer.consume(data),
                    err_fn,
                    None,
                ),
                cpal::SampleFormat::I16 => {
                    let mut scratch: Vec<f32> = Vec::new();
                    self.device.build_input_stream(
                        &self.config,
                        move |data: &[i16], _| {
                            scratch.clear();
                            scratch
                                .extend(data.iter().map(|&s| s as f32 / i16::MAX as f32));
                            slicer.consume(&scratch);
                        },
                        err_fn,
                        None,
                    )
                }
                cpal::SampleFormat::U16 => {
                    let mut scratch: Vec<f32> = Vec::new();
                    self.device.build_input_stream(
                        &self.config,
                        move |data: &[u16], _| {
                            scratch.clear();
                            scratch.extend(
                                data.iter()
                                    .map(|&s| (s as f32 - 32768.0) / 32768.0),
                            );
                            slicer.consume(&scratch);
                        },
                        err_fn,
                        None,
                    )
                }
                other => {
                    return Err(VismicError::AudioCapture {
                        message: format!("Unsupported sample format: {:?}", other),
                    });
                }
            };

            stream.map_err(map_build_error)
        }
    }

    fn map_config_error(device: &cpal::Device, e: cpal::DefaultStreamConfigError) -> VismicError {
        let name = device.name().unwrap_or_else(|_| "unknown".to_string());
        match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => {
                VismicError::AudioDeviceNotFound { device: name }
            }
            other => VismicError::AudioCapture {
                message: format!("No usable input config on {}: {}", name, other),
            },
        }
    }

    fn map_build_error(e: cpal::BuildStreamError) -> VismicError {
        match e {
            cpal::BuildStreamError::DeviceNotAvailable => VismicError::AudioDeviceNotFound {
                device: "default".to_string(),
            },
            other => VismicError::AudioCapture {
                message: format!("Failed to open input stream: {}", other),
            },
        }
    }

    impl CaptureSource for CpalCaptureSource {
        fn start(&mut self, sink: FrameBuffer) -> Result<()> {
            let stream = self.build_stream(sink)?;
            stream.play().map_err(|e| VismicError::AudioCapture {
                message: format!("Failed to start input stream: {}", e),
            })?;

            let mut slot = match self.stream.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *slot = Some(SendableStream(stream));
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            let mut slot = match self.stream.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            // Dropping the stream stops the callback.
            *slot = None;
            Ok(())
        }

        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }
    }
}
