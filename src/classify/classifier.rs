//! Classifier trait and startup selection with graceful fallback.

use crate::audio::frame::AudioFrame;
use crate::classify::heuristic::HeuristicClassifier;
use crate::classify::phoneme::PhonemeEvent;
use crate::error::{Result, VismicError};
use std::path::Path;
use std::sync::Arc;

/// Trait for frame-to-phoneme classification.
///
/// Allows swapping implementations (model-backed engine vs heuristic vs
/// mock). Both real variants must return within a bounded time budget per
/// frame; the pipeline driver treats any error as "no event this tick".
pub trait PhonemeClassifier: Send + Sync {
    /// Classifies one frame into zero or more phoneme events.
    fn classify(&self, frame: &AudioFrame) -> Result<Vec<PhonemeEvent>>;

    /// Name of the classifier, for diagnostics.
    fn name(&self) -> &str;

    /// True when this is the heuristic stand-in rather than a real engine.
    fn is_fallback(&self) -> bool;
}

/// Implement PhonemeClassifier for Arc<T> to allow sharing.
impl<T: PhonemeClassifier + ?Sized> PhonemeClassifier for Arc<T> {
    fn classify(&self, frame: &AudioFrame) -> Result<Vec<PhonemeEvent>> {
        (**self).classify(frame)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_fallback(&self) -> bool {
        (**self).is_fallback()
    }
}

/// Selects the classifier once at startup.
///
/// Tries the model-backed engine when a model path is configured; any load
/// failure is logged as informational and the heuristic fallback is returned
/// instead. This function never errors: classifier unavailability is not an
/// error, it is a degraded-but-operable mode.
pub fn init_classifier(model_path: Option<&Path>) -> Arc<dyn PhonemeClassifier> {
    match model_path {
        Some(path) => match crate::classify::engine::EngineClassifier::load(path) {
            Ok(engine) => Arc::new(engine),
            Err(e) => {
                eprintln!("vismic: phoneme engine unavailable ({e}), using heuristic classifier");
                Arc::new(HeuristicClassifier::new())
            }
        },
        None => Arc::new(HeuristicClassifier::new()),
    }
}

/// Mock classifier for testing.
///
/// Emits a scripted sequence of labels, one per call, cycling when
/// exhausted. An empty script yields empty classifications.
pub struct MockClassifier {
    script: Vec<String>,
    cursor: std::sync::atomic::AtomicUsize,
    should_fail: bool,
}

impl MockClassifier {
    /// Creates a mock with an empty script.
    pub fn new() -> Self {
        Self {
            script: Vec::new(),
            cursor: std::sync::atomic::AtomicUsize::new(0),
            should_fail: false,
        }
    }

    /// Configure the labels emitted on successive calls.
    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.script = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Configure the mock to fail on classify.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PhonemeClassifier for MockClassifier {
    fn classify(&self, frame: &AudioFrame) -> Result<Vec<PhonemeEvent>> {
        if self.should_fail {
            return Err(VismicError::Classification {
                message: "mock classification failure".to_string(),
            });
        }
        if self.script.is_empty() {
            return Ok(Vec::new());
        }

        let index = self
            .cursor
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            % self.script.len();
        let duration = std::time::Duration::from_millis(frame.duration_ms() as u64);
        Ok(vec![PhonemeEvent::spanning(&self.script[index], duration)])
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn is_fallback(&self) -> bool {
        false
    }
}
