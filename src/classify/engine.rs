//! Primary classifier backed by a recognition model file.
//!
//! The model is a JSON decision table: an ordered list of bands, each naming
//! the label to emit when a frame's RMS energy and zero-crossing rate fall
//! inside the band's ranges. This is the seam where a native phoneme engine
//! plugs in; when the model cannot be loaded at startup the pipeline falls
//! back to the heuristic classifier without surfacing an error.

use crate::audio::frame::AudioFrame;
use crate::classify::classifier::PhonemeClassifier;
use crate::classify::heuristic::{calculate_rms, zero_crossing_rate};
use crate::classify::phoneme::{PhonemeEvent, labels};
use crate::error::{Result, VismicError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// One row of the model's decision table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelBand {
    /// Label emitted when the band matches.
    pub label: String,
    /// Inclusive lower RMS bound.
    #[serde(default)]
    pub min_energy: f32,
    /// Exclusive upper RMS bound.
    #[serde(default = "band_max")]
    pub max_energy: f32,
    /// Inclusive lower zero-crossing-rate bound.
    #[serde(default)]
    pub min_zcr: f32,
    /// Exclusive upper zero-crossing-rate bound.
    #[serde(default = "band_max")]
    pub max_zcr: f32,
}

fn band_max() -> f32 {
    f32::MAX
}

impl LabelBand {
    fn matches(&self, rms: f32, zcr: f32) -> bool {
        rms >= self.min_energy && rms < self.max_energy && zcr >= self.min_zcr && zcr < self.max_zcr
    }
}

/// On-disk model format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineModel {
    /// Human-readable model name, reported via `PhonemeClassifier::name`.
    pub name: String,
    /// RMS threshold below which the frame is rest, before bands are tried.
    pub silence_threshold: f32,
    /// Ordered decision table; first matching band wins.
    pub bands: Vec<LabelBand>,
}

impl EngineModel {
    fn validate(&self) -> Result<()> {
        if self.bands.is_empty() {
            return Err(VismicError::ClassifierModelInvalid {
                message: "model has no label bands".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.silence_threshold) {
            return Err(VismicError::ClassifierModelInvalid {
                message: format!(
                    "silence_threshold {} outside 0.0..=1.0",
                    self.silence_threshold
                ),
            });
        }
        Ok(())
    }
}

/// Phoneme classifier driven by a loaded [`EngineModel`].
#[derive(Debug, Clone)]
pub struct EngineClassifier {
    model: EngineModel,
}

impl EngineClassifier {
    /// Loads and validates a model file.
    ///
    /// # Errors
    /// Returns `ClassifierModelNotFound` when the file is missing and
    /// `ClassifierModelInvalid` when it does not parse or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VismicError::ClassifierModelNotFound {
                    path: path.display().to_string(),
                }
            } else {
                VismicError::Io(e)
            }
        })?;

        let model: EngineModel =
            serde_json::from_str(&contents).map_err(|e| VismicError::ClassifierModelInvalid {
                message: e.to_string(),
            })?;
        model.validate()?;

        Ok(Self { model })
    }

    /// Constructs a classifier from an already-built model (tests, embedders
    /// that ship a compiled-in table).
    pub fn from_model(model: EngineModel) -> Result<Self> {
        model.validate()?;
        Ok(Self { model })
    }
}

impl PhonemeClassifier for EngineClassifier {
    fn classify(&self, frame: &AudioFrame) -> Result<Vec<PhonemeEvent>> {
        let duration = Duration::from_millis(frame.duration_ms() as u64);
        let rms = calculate_rms(&frame.samples);

        if rms < self.model.silence_threshold {
            return Ok(vec![PhonemeEvent::spanning(labels::REST, duration)]);
        }

        let zcr = zero_crossing_rate(&frame.samples);
        let event = self
            .model
            .bands
            .iter()
            .find(|band| band.matches(rms, zcr))
            .map(|band| PhonemeEvent::spanning(&band.label, duration));

        // No matching band: report nothing rather than guessing; the
        // smoother holds the previous category for absent events.
        Ok(event.into_iter().collect())
    }

    fn name(&self) -> &str {
        &self.model.name
    }

    fn is_fallback(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn test_model() -> EngineModel {
        EngineModel {
            name: "test-table".to_string(),
            silence_threshold: 0.02,
            bands: vec![
                LabelBand {
                    label: "f".to_string(),
                    min_energy: 0.0,
                    max_energy: f32::MAX,
                    min_zcr: 0.3,
                    max_zcr: f32::MAX,
                },
                LabelBand {
                    label: "a".to_string(),
                    min_energy: 0.2,
                    max_energy: f32::MAX,
                    min_zcr: 0.0,
                    max_zcr: 0.3,
                },
                LabelBand {
                    label: "m".to_string(),
                    min_energy: 0.0,
                    max_energy: 0.2,
                    min_zcr: 0.0,
                    max_zcr: 0.3,
                },
            ],
        }
    }

    fn frame_of(samples: Vec<f32>) -> AudioFrame {
        AudioFrame::new(0, samples, 16000)
    }

    #[test]
    fn test_load_valid_model_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&test_model()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let classifier = EngineClassifier::load(file.path()).unwrap();
        assert_eq!(classifier.name(), "test-table");
        assert!(!classifier.is_fallback());
    }

    #[test]
    fn test_load_missing_file() {
        let result = EngineClassifier::load(Path::new("/nonexistent/model.json"));
        assert!(matches!(
            result,
            Err(VismicError::ClassifierModelNotFound { .. })
        ));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json at all").unwrap();

        let result = EngineClassifier::load(file.path());
        assert!(matches!(
            result,
            Err(VismicError::ClassifierModelInvalid { .. })
        ));
    }

    #[test]
    fn test_empty_bands_rejected() {
        let model = EngineModel {
            name: "empty".to_string(),
            silence_threshold: 0.02,
            bands: vec![],
        };
        assert!(matches!(
            EngineClassifier::from_model(model),
            Err(VismicError::ClassifierModelInvalid { .. })
        ));
    }

    #[test]
    fn test_out_of_range_silence_threshold_rejected() {
        let mut model = test_model();
        model.silence_threshold = 1.5;
        assert!(matches!(
            EngineClassifier::from_model(model),
            Err(VismicError::ClassifierModelInvalid { .. })
        ));
    }

    #[test]
    fn test_silence_maps_to_rest() {
        let classifier = EngineClassifier::from_model(test_model()).unwrap();
        let events = classifier.classify(&frame_of(vec![0.001; 800])).unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_rest());
    }

    #[test]
    fn test_first_matching_band_wins() {
        let classifier = EngineClassifier::from_model(test_model()).unwrap();

        // Loud alternating signal: ZCR ~1.0 matches the fricative band
        // before the loud-vowel band is even considered.
        let alternating: Vec<f32> = (0..800)
            .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let events = classifier.classify(&frame_of(alternating)).unwrap();
        assert_eq!(events[0].label, "f");
    }

    #[test]
    fn test_quiet_voiced_frame_hits_consonant_band() {
        let classifier = EngineClassifier::from_model(test_model()).unwrap();
        // Constant positive offset: zero crossings = 0, RMS = 0.1.
        let events = classifier.classify(&frame_of(vec![0.1; 800])).unwrap();
        assert_eq!(events[0].label, "m");
    }

    #[test]
    fn test_no_matching_band_returns_empty() {
        let model = EngineModel {
            name: "narrow".to_string(),
            silence_threshold: 0.02,
            bands: vec![LabelBand {
                label: "a".to_string(),
                min_energy: 0.9,
                max_energy: f32::MAX,
                min_zcr: 0.0,
                max_zcr: f32::MAX,
            }],
        };
        let classifier = EngineClassifier::from_model(model).unwrap();

        let events = classifier.classify(&frame_of(vec![0.1; 800])).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_band_defaults_deserialize() {
        let json = r#"{ "label": "o", "min_energy": 0.1 }"#;
        let band: LabelBand = serde_json::from_str(json).unwrap();
        assert_eq!(band.label, "o");
        assert_eq!(band.max_energy, f32::MAX);
        assert_eq!(band.min_zcr, 0.0);
    }
}
