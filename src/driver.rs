//! Pipeline driver that runs from startup until shutdown.
//!
//! One render tick does at most three things, in order: pull and classify
//! a buffered frame (throttled), apply the resolved mouth viseme, advance
//! the blink machine. Everything the driver touches is owned by the render
//! thread; the only crossings are the frame buffer (fed by the capture
//! callback) and the control channel.

use crate::anim::{AnimationState, BlinkConfig, BlinkMachine, BlinkPhase, EyeState};
use crate::audio::{CaptureSource, FrameBuffer};
use crate::classify::PhonemeClassifier;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::defaults;
use crate::render::SpriteSurface;
use crate::viseme::{VisemeCategory, VisemeSmoother};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Render tick period (~60Hz).
    pub tick_interval: Duration,
    /// Minimum spacing between classification attempts.
    pub classify_interval: Duration,
    /// Frame buffer capacity, in frames.
    pub buffer_frames: usize,
    /// Smoothing strength in [0.0, 1.0].
    pub smoothing_strength: f32,
    /// Smoothing history length.
    pub history_len: usize,
    /// Blink timing.
    pub blink: BlinkConfig,
    /// Control channel capacity.
    pub control_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval: defaults::TICK_INTERVAL,
            classify_interval: defaults::CLASSIFY_INTERVAL,
            buffer_frames: defaults::FRAME_BUFFER_CAPACITY,
            smoothing_strength: defaults::SMOOTHING_STRENGTH,
            history_len: defaults::SMOOTHING_HISTORY_LEN,
            blink: BlinkConfig::default(),
            control_buffer: 32,
        }
    }
}

impl PipelineConfig {
    /// Builds a pipeline configuration from the loaded application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            buffer_frames: config.audio.buffer_frames,
            smoothing_strength: config.smoothing.strength,
            history_len: config.smoothing.history_len,
            blink: config.blink.to_blink_config(),
            ..Default::default()
        }
    }
}

/// Control messages the handle sends into the render loop.
#[derive(Debug, Clone)]
enum Control {
    AudioEnabled(bool),
    VisemeOverride(Option<VisemeCategory>),
    EyeOverride(Option<EyeState>),
    TriggerBlink,
    SmoothingStrength(f32),
    ResetSmoothing,
}

/// Read-only view of the pipeline, published once per tick.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Viseme currently on the mouth layer.
    pub current_viseme: VisemeCategory,
    /// Phase of the autonomous blink cycle.
    pub blink_phase: BlinkPhase,
    /// Eye state currently displayed.
    pub eye_state: EyeState,
    /// Recently emitted categories, oldest first.
    pub smoothing_history: Vec<VisemeCategory>,
    /// Name of the active classifier.
    pub classifier_name: String,
    /// True when the heuristic fallback is classifying.
    pub fallback_active: bool,
    /// False after a capture failure or an explicit disable.
    pub audio_enabled: bool,
    /// Frames waiting in the buffer.
    pub buffered_frames: usize,
    /// Frames discarded because the buffer was full.
    pub dropped_frames: u64,
    /// Ticks processed so far.
    pub ticks: u64,
    /// Classification attempts that produced events.
    pub classifications: u64,
    /// Classification attempts that failed.
    pub classify_errors: u64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            current_viseme: VisemeCategory::Idle,
            blink_phase: BlinkPhase::Open,
            eye_state: EyeState::Open,
            smoothing_history: Vec::new(),
            classifier_name: String::new(),
            fallback_active: false,
            audio_enabled: false,
            buffered_frames: 0,
            dropped_frames: 0,
            ticks: 0,
            classifications: 0,
            classify_errors: 0,
        }
    }
}

/// Per-character driver: audio frames in, sprite changes out.
pub struct PipelineDriver {
    frames: FrameBuffer,
    classifier: Arc<dyn PhonemeClassifier>,
    smoother: VisemeSmoother,
    anim: AnimationState,
    surface: Box<dyn SpriteSurface>,
    clock: Arc<dyn Clock>,
    classify_interval: Duration,
    last_classify: Option<Instant>,
    classify_in_flight: bool,
    audio_enabled: bool,
    viseme_override: Option<VisemeCategory>,
    resolved: VisemeCategory,
    ticks: u64,
    classifications: u64,
    classify_errors: u64,
}

impl PipelineDriver {
    /// Creates a driver wired to the given buffer, classifier and surface.
    pub fn new(
        config: &PipelineConfig,
        frames: FrameBuffer,
        classifier: Arc<dyn PhonemeClassifier>,
        surface: Box<dyn SpriteSurface>,
    ) -> Self {
        let smoother =
            VisemeSmoother::new(config.smoothing_strength).with_history_cap(config.history_len);
        Self {
            frames,
            classifier,
            smoother,
            anim: AnimationState::new(config.blink.clone()),
            surface,
            clock: Arc::new(SystemClock),
            classify_interval: config.classify_interval,
            last_classify: None,
            classify_in_flight: false,
            audio_enabled: true,
            viseme_override: None,
            resolved: VisemeCategory::Idle,
            ticks: 0,
            classifications: 0,
            classify_errors: 0,
        }
    }

    /// Sets a custom clock (for deterministic testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the blink machine (seeded machines in tests).
    pub fn with_blink_machine(mut self, blink: BlinkMachine) -> Self {
        self.anim = self.anim.with_blink_machine(blink);
        self
    }

    /// Marks the audio path as degraded from the start (capture failed).
    pub fn with_audio_disabled(mut self) -> Self {
        self.audio_enabled = false;
        self
    }

    /// Advances the pipeline by one render tick.
    ///
    /// `delta` is the wall time since the previous tick; blink timing
    /// accumulates it, so a late tick does not stall the eyes.
    pub fn tick(&mut self, delta: Duration) {
        self.ticks += 1;
        self.maybe_classify();

        let mouth = self.viseme_override.unwrap_or(self.resolved);
        self.anim.apply_viseme(mouth, self.surface.as_mut());
        self.anim.tick_blink(delta, self.surface.as_mut());
    }

    /// Runs at most one dequeue-and-classify per throttle window.
    ///
    /// Skipped entirely while a manual viseme override pins the mouth;
    /// fresh audio is waiting in the buffer when the override lifts.
    fn maybe_classify(&mut self) {
        if !self.audio_enabled || self.viseme_override.is_some() || self.classify_in_flight {
            return;
        }

        let now = self.clock.now();
        if let Some(last) = self.last_classify {
            if now.duration_since(last) < self.classify_interval {
                return;
            }
        }
        self.last_classify = Some(now);

        let Some(frame) = self.frames.pop_oldest() else {
            // Nothing captured this window: silence.
            self.resolved = self.smoother.resolve(None);
            return;
        };

        self.classify_in_flight = true;
        let outcome = self.classifier.classify(&frame);
        self.classify_in_flight = false;

        match outcome {
            Ok(events) => {
                self.classifications += 1;
                self.resolved = self.smoother.resolve(events.first());
            }
            Err(e) => {
                // A failed classification never propagates past the driver:
                // the frame counts as silence and the mouth holds or decays.
                self.classify_errors += 1;
                eprintln!("vismic: classification failed: {e}");
                self.resolved = self.smoother.resolve(None);
            }
        }
    }

    fn apply(&mut self, control: Control) {
        match control {
            Control::AudioEnabled(enabled) => self.set_audio_enabled(enabled),
            Control::VisemeOverride(category) => self.set_viseme_override(category),
            Control::EyeOverride(state) => self.set_eye_override(state),
            Control::TriggerBlink => self.trigger_blink(),
            Control::SmoothingStrength(strength) => self.set_smoothing_strength(strength),
            Control::ResetSmoothing => self.reset_smoothing(),
        }
    }

    /// Enables or disables the audio path. Blinking is unaffected.
    ///
    /// Disabling drops buffered frames and clears the smoothing history so
    /// stale audio cannot drive the mouth after a re-enable.
    pub fn set_audio_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.frames.clear();
            self.smoother.reset();
            self.resolved = VisemeCategory::Idle;
        }
        self.audio_enabled = enabled;
    }

    /// Pins the mouth to a category, or releases the pin with `None`.
    ///
    /// Classification pauses while pinned; release snaps back to the live
    /// signal on the next eligible window.
    pub fn set_viseme_override(&mut self, category: Option<VisemeCategory>) {
        self.viseme_override = category;
    }

    /// Pins the eyes open or closed, or returns them to autonomous blinking.
    pub fn set_eye_override(&mut self, state: Option<EyeState>) {
        match state {
            Some(state) => self.anim.blink_mut().set_forced(state),
            None => self.anim.blink_mut().release_forced(),
        }
    }

    /// Forces an immediate blink.
    pub fn trigger_blink(&mut self) {
        self.anim.blink_mut().trigger_blink();
    }

    /// Updates the smoothing strength, clamped to [0.0, 1.0].
    pub fn set_smoothing_strength(&mut self, strength: f32) {
        self.smoother.set_strength(strength);
    }

    /// Clears the smoothing history and any pending transition.
    pub fn reset_smoothing(&mut self) {
        self.smoother.reset();
    }

    /// True while the audio path is feeding the mouth.
    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    /// Current read-only view of the driver.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            current_viseme: self.anim.current_viseme(),
            blink_phase: self.anim.blink().phase(),
            eye_state: self.anim.blink().eye_state(),
            smoothing_history: self.smoother.history(),
            classifier_name: self.classifier.name().to_string(),
            fallback_active: self.classifier.is_fallback(),
            audio_enabled: self.audio_enabled,
            buffered_frames: self.frames.len(),
            dropped_frames: self.frames.dropped_frames(),
            ticks: self.ticks,
            classifications: self.classifications,
            classify_errors: self.classify_errors,
        }
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    /// Flag to signal shutdown
    running: Arc<AtomicBool>,
    /// Control channel into the render loop
    control_tx: Sender<Control>,
    /// Snapshot published by the render loop once per tick
    snapshot: Arc<std::sync::Mutex<Snapshot>>,
    /// Render loop join handle
    thread: Option<JoinHandle<()>>,
}

impl PipelineHandle {
    /// Returns true if the pipeline is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        match self.snapshot.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Enables or disables the audio path.
    pub fn set_audio_enabled(&self, enabled: bool) {
        self.send(Control::AudioEnabled(enabled));
    }

    /// Pins the mouth to a category, or releases the pin with `None`.
    pub fn set_viseme_override(&self, category: Option<VisemeCategory>) {
        self.send(Control::VisemeOverride(category));
    }

    /// Pins the eyes open or closed, or returns them to autonomous blinking.
    pub fn set_eye_override(&self, state: Option<EyeState>) {
        self.send(Control::EyeOverride(state));
    }

    /// Forces an immediate blink.
    pub fn trigger_blink(&self) {
        self.send(Control::TriggerBlink);
    }

    /// Updates the smoothing strength, clamped to [0.0, 1.0].
    pub fn set_smoothing_strength(&self, strength: f32) {
        self.send(Control::SmoothingStrength(strength));
    }

    /// Clears the smoothing history and any pending transition.
    pub fn reset_smoothing(&self) {
        self.send(Control::ResetSmoothing);
    }

    fn send(&self, control: Control) {
        // A full or disconnected channel means the loop is gone or drowning
        // in controls; either way dropping the message is the right call.
        let _ = self.control_tx.try_send(control);
    }

    /// Stops the pipeline gracefully.
    ///
    /// Signals shutdown, then joins the render thread. The loop stops the
    /// capture source and drains state before exiting.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            if let Err(panic_info) = handle.join() {
                let msg = panic_info
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                    .unwrap_or("unknown panic");
                eprintln!("vismic: render thread panicked: {msg}");
            }
        }
    }
}

/// Animation pipeline: CaptureSource → FrameBuffer → classifier → smoother
/// → animation state → SpriteSurface.
pub struct Pipeline {
    config: PipelineConfig,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    /// Creates a new pipeline.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets a custom clock (for deterministic testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Starts the render loop at ~60Hz.
    ///
    /// A capture source that fails to start degrades the pipeline to
    /// audio-disabled instead of failing it: the character keeps blinking
    /// with an idle mouth, and the snapshot reports `audio_enabled: false`.
    pub fn start(
        self,
        capture: Option<Box<dyn CaptureSource>>,
        classifier: Arc<dyn PhonemeClassifier>,
        surface: Box<dyn SpriteSurface>,
    ) -> PipelineHandle {
        let frames = FrameBuffer::new(self.config.buffer_frames);

        let mut capture = capture;
        let mut audio_enabled = capture.is_some();
        if let Some(source) = capture.as_mut() {
            if let Err(e) = source.start(frames.clone()) {
                eprintln!("vismic: audio capture unavailable ({e}), continuing without audio");
                audio_enabled = false;
                capture = None;
            }
        }

        let mut driver = PipelineDriver::new(
            &self.config,
            frames,
            classifier,
            surface,
        )
        .with_clock(self.clock.clone());
        if !audio_enabled {
            driver = driver.with_audio_disabled();
        }

        let running = Arc::new(AtomicBool::new(true));
        let (control_tx, control_rx): (Sender<Control>, Receiver<Control>) =
            bounded(self.config.control_buffer);
        let snapshot = Arc::new(std::sync::Mutex::new(driver.snapshot()));

        let loop_running = running.clone();
        let loop_snapshot = snapshot.clone();
        let tick_interval = self.config.tick_interval;
        let thread = thread::spawn(move || {
            let mut last_tick = Instant::now();

            while loop_running.load(Ordering::SeqCst) {
                while let Ok(control) = control_rx.try_recv() {
                    driver.apply(control);
                }

                let now = Instant::now();
                driver.tick(now.duration_since(last_tick));
                last_tick = now;

                let view = driver.snapshot();
                match loop_snapshot.lock() {
                    Ok(mut guard) => *guard = view,
                    Err(poisoned) => *poisoned.into_inner() = view,
                }

                thread::sleep(tick_interval);
            }

            if let Some(mut source) = capture {
                if let Err(e) = source.stop() {
                    eprintln!("vismic: failed to stop audio capture: {e}");
                }
            }
        });

        PipelineHandle {
            running,
            control_tx,
            snapshot,
            thread: Some(thread),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioFrame, MockCaptureSource};
    use crate::classify::MockClassifier;
    use crate::clock::MockClock;
    use crate::render::{NullSurface, SharedRecordingSurface, SpriteLayer};

    fn frame(sequence: u64) -> AudioFrame {
        AudioFrame::new(sequence, vec![0.1; 800], 16000)
    }

    fn fill_buffer(frames: &FrameBuffer, count: u64) {
        for sequence in 0..count {
            frames.push(frame(sequence));
        }
    }

    fn instant_config() -> PipelineConfig {
        PipelineConfig {
            smoothing_strength: 0.0,
            ..Default::default()
        }
    }

    fn driver_with(
        config: PipelineConfig,
        classifier: Arc<dyn PhonemeClassifier>,
        surface: SharedRecordingSurface,
    ) -> (PipelineDriver, FrameBuffer, MockClock) {
        let frames = FrameBuffer::new(config.buffer_frames);
        let clock = MockClock::new();
        let driver = PipelineDriver::new(&config, frames.clone(), classifier, Box::new(surface))
            .with_clock(Arc::new(clock.clone()));
        (driver, frames, clock)
    }

    #[test]
    fn test_tick_applies_classified_viseme() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new().with_labels(&["a"]));
        let (mut driver, frames, _clock) =
            driver_with(instant_config(), classifier, surface.clone());

        fill_buffer(&frames, 1);
        driver.tick(Duration::from_millis(16));

        assert_eq!(surface.keys_for(SpriteLayer::Mouth), vec!["mouth_a"]);
        assert_eq!(driver.snapshot().current_viseme, VisemeCategory::A);
    }

    #[test]
    fn test_classification_is_throttled() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new().with_labels(&["a"]));
        let (mut driver, frames, clock) =
            driver_with(instant_config(), classifier, surface.clone());

        fill_buffer(&frames, 10);

        // Three ticks inside one 50ms window: exactly one classification.
        driver.tick(Duration::from_millis(16));
        driver.tick(Duration::from_millis(16));
        driver.tick(Duration::from_millis(16));
        assert_eq!(driver.snapshot().classifications, 1);

        // Crossing the window allows the next one.
        clock.advance(defaults::CLASSIFY_INTERVAL);
        driver.tick(Duration::from_millis(16));
        assert_eq!(driver.snapshot().classifications, 2);
    }

    #[test]
    fn test_empty_buffer_resolves_idle() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new().with_labels(&["a"]));
        let (mut driver, _frames, _clock) =
            driver_with(instant_config(), classifier, surface.clone());

        driver.tick(Duration::from_millis(16));

        assert_eq!(surface.keys_for(SpriteLayer::Mouth), vec!["mouth_idle"]);
    }

    #[test]
    fn test_classifier_error_counts_and_resolves_idle() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new().with_failure());
        let (mut driver, frames, _clock) =
            driver_with(instant_config(), classifier, surface.clone());

        fill_buffer(&frames, 1);
        driver.tick(Duration::from_millis(16));

        let snapshot = driver.snapshot();
        assert_eq!(snapshot.classify_errors, 1);
        assert_eq!(snapshot.classifications, 0);
        assert_eq!(snapshot.current_viseme, VisemeCategory::Idle);
    }

    #[test]
    fn test_spike_is_suppressed_at_sprite_level() {
        // [a, a, e, a, a] at strength 0.7: the surface never sees mouth_e.
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new().with_labels(&["a", "a", "e", "a", "a"]));
        let config = PipelineConfig {
            smoothing_strength: 0.7,
            ..Default::default()
        };
        let (mut driver, frames, clock) = driver_with(config, classifier, surface.clone());

        fill_buffer(&frames, 5);
        for _ in 0..5 {
            driver.tick(Duration::from_millis(16));
            clock.advance(defaults::CLASSIFY_INTERVAL);
        }

        assert_eq!(surface.keys_for(SpriteLayer::Mouth), vec!["mouth_a"]);
    }

    #[test]
    fn test_disable_audio_clears_buffer_and_history() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new().with_labels(&["a"]));
        let (mut driver, frames, clock) =
            driver_with(instant_config(), classifier, surface.clone());

        fill_buffer(&frames, 5);
        driver.tick(Duration::from_millis(16));
        assert_eq!(driver.snapshot().current_viseme, VisemeCategory::A);

        driver.set_audio_enabled(false);
        let snapshot = driver.snapshot();
        assert!(!snapshot.audio_enabled);
        assert_eq!(snapshot.buffered_frames, 0);
        assert!(snapshot.smoothing_history.is_empty());

        // Further ticks classify nothing and the mouth goes idle.
        clock.advance(defaults::CLASSIFY_INTERVAL);
        fill_buffer(&frames, 1);
        driver.tick(Duration::from_millis(16));
        assert_eq!(driver.snapshot().classifications, 1);
        assert_eq!(driver.snapshot().current_viseme, VisemeCategory::Idle);
    }

    #[test]
    fn test_blink_keeps_running_with_audio_disabled() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new());
        let blink = BlinkMachine::with_seed(
            BlinkConfig {
                interval: Duration::from_millis(100)..=Duration::from_millis(100),
                hold: Duration::from_millis(50),
            },
            1,
        );
        let (driver, _frames, _clock) = driver_with(instant_config(), classifier, surface.clone());
        let mut driver = driver.with_blink_machine(blink);

        driver.set_audio_enabled(false);
        driver.tick(Duration::from_millis(100));
        assert_eq!(driver.snapshot().eye_state, EyeState::Closed);

        driver.tick(Duration::from_millis(50));
        assert_eq!(driver.snapshot().eye_state, EyeState::Open);
    }

    #[test]
    fn test_viseme_override_wins_over_classification() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new().with_labels(&["a"]));
        let (mut driver, frames, clock) =
            driver_with(instant_config(), classifier, surface.clone());

        driver.set_viseme_override(Some(VisemeCategory::O));
        fill_buffer(&frames, 3);
        driver.tick(Duration::from_millis(16));
        clock.advance(defaults::CLASSIFY_INTERVAL);
        driver.tick(Duration::from_millis(16));

        assert_eq!(surface.keys_for(SpriteLayer::Mouth), vec!["mouth_o"]);

        // Releasing snaps back to the live signal on the next tick.
        driver.set_viseme_override(None);
        clock.advance(defaults::CLASSIFY_INTERVAL);
        driver.tick(Duration::from_millis(16));
        assert_eq!(
            surface.keys_for(SpriteLayer::Mouth),
            vec!["mouth_o", "mouth_a"]
        );
    }

    #[test]
    fn test_eye_override_and_release() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new());
        let (mut driver, _frames, _clock) =
            driver_with(instant_config(), classifier, surface.clone());

        driver.set_eye_override(Some(EyeState::Closed));
        driver.tick(Duration::from_millis(16));
        assert_eq!(driver.snapshot().eye_state, EyeState::Closed);

        // Hours of ticks cannot reopen a forced-closed eye.
        driver.tick(Duration::from_secs(3600));
        assert_eq!(driver.snapshot().eye_state, EyeState::Closed);

        driver.set_eye_override(None);
        driver.tick(Duration::from_millis(16));
        assert_eq!(driver.snapshot().eye_state, EyeState::Open);
    }

    #[test]
    fn test_trigger_blink_closes_eyes_immediately() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new());
        let (mut driver, _frames, _clock) =
            driver_with(instant_config(), classifier, surface.clone());

        driver.trigger_blink();
        driver.tick(Duration::from_millis(1));
        assert_eq!(driver.snapshot().eye_state, EyeState::Closed);
    }

    #[test]
    fn test_set_smoothing_strength_takes_effect() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new().with_labels(&["a", "e", "o"]));
        let config = PipelineConfig {
            smoothing_strength: 1.0,
            ..Default::default()
        };
        let (mut driver, frames, clock) = driver_with(config, classifier, surface.clone());

        fill_buffer(&frames, 3);
        driver.tick(Duration::from_millis(16));
        clock.advance(defaults::CLASSIFY_INTERVAL);
        driver.tick(Duration::from_millis(16));
        // Locked: still A.
        assert_eq!(driver.snapshot().current_viseme, VisemeCategory::A);

        driver.set_smoothing_strength(0.0);
        clock.advance(defaults::CLASSIFY_INTERVAL);
        driver.tick(Duration::from_millis(16));
        assert_eq!(driver.snapshot().current_viseme, VisemeCategory::O);
    }

    #[test]
    fn test_snapshot_reports_classifier_identity() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(crate::classify::HeuristicClassifier::new());
        let (driver, _frames, _clock) = driver_with(instant_config(), classifier, surface);

        let snapshot = driver.snapshot();
        assert_eq!(snapshot.classifier_name, "heuristic");
        assert!(snapshot.fallback_active);
    }

    #[test]
    fn test_snapshot_reports_dropped_frames() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new());
        let config = PipelineConfig {
            buffer_frames: 2,
            smoothing_strength: 0.0,
            ..Default::default()
        };
        let (driver, frames, _clock) = driver_with(config, classifier, surface);

        fill_buffer(&frames, 5);
        let snapshot = driver.snapshot();
        assert_eq!(snapshot.buffered_frames, 2);
        assert_eq!(snapshot.dropped_frames, 3);
    }

    #[test]
    fn test_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(16));
        assert_eq!(config.classify_interval, Duration::from_millis(50));
        assert_eq!(config.buffer_frames, 20);
        assert_eq!(config.smoothing_strength, 0.7);
    }

    #[test]
    fn test_pipeline_start_and_stop() {
        let surface = SharedRecordingSurface::new();
        let capture = Box::new(
            MockCaptureSource::new().with_frames(vec![vec![0.1; 800], vec![0.1; 800]]),
        );
        let classifier = Arc::new(MockClassifier::new().with_labels(&["a"]));

        let handle = Pipeline::new(PipelineConfig {
            smoothing_strength: 0.0,
            ..Default::default()
        })
        .start(Some(capture), classifier, Box::new(surface.clone()));

        assert!(handle.is_running());
        thread::sleep(Duration::from_millis(150));
        handle.stop();

        assert_eq!(surface.keys_for(SpriteLayer::Mouth)[0], "mouth_a");
    }

    #[test]
    fn test_pipeline_capture_failure_degrades_to_no_audio() {
        let capture = Box::new(
            MockCaptureSource::new()
                .with_start_failure()
                .with_error_message("device busy"),
        );
        let classifier = Arc::new(MockClassifier::new());

        let handle = Pipeline::new(PipelineConfig::default()).start(
            Some(capture),
            classifier,
            Box::new(NullSurface),
        );

        thread::sleep(Duration::from_millis(60));
        let snapshot = handle.snapshot();
        assert!(handle.is_running());
        assert!(!snapshot.audio_enabled);
        assert!(snapshot.ticks > 0);
        handle.stop();
    }

    #[test]
    fn test_pipeline_control_messages_reach_the_loop() {
        let surface = SharedRecordingSurface::new();
        let classifier = Arc::new(MockClassifier::new());

        let handle = Pipeline::new(PipelineConfig::default()).start(
            None,
            classifier,
            Box::new(surface.clone()),
        );

        handle.set_viseme_override(Some(VisemeCategory::F));
        thread::sleep(Duration::from_millis(100));
        assert_eq!(handle.snapshot().current_viseme, VisemeCategory::F);
        handle.stop();

        let keys = surface.keys_for(SpriteLayer::Mouth);
        assert!(keys.contains(&"mouth_f".to_string()));
    }

    #[test]
    fn test_pipeline_without_capture_runs_audio_disabled() {
        let handle = Pipeline::new(PipelineConfig::default()).start(
            None,
            Arc::new(MockClassifier::new()),
            Box::new(NullSurface),
        );

        thread::sleep(Duration::from_millis(60));
        assert!(!handle.snapshot().audio_enabled);
        handle.stop();
    }

    #[test]
    fn test_from_config_carries_tuning() {
        let mut config = Config::default();
        config.smoothing.strength = 0.25;
        config.audio.buffer_frames = 7;
        config.blink.hold_ms = 90;

        let pipeline = PipelineConfig::from_config(&config);
        assert_eq!(pipeline.smoothing_strength, 0.25);
        assert_eq!(pipeline.buffer_frames, 7);
        assert_eq!(pipeline.blink.hold, Duration::from_millis(90));
    }
}
