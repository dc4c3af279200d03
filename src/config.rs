//! Configuration loading and validation.

use crate::defaults;
use crate::error::{Result, VismicError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub classifier: ClassifierConfig,
    pub smoothing: SmoothingConfig,
    pub blink: BlinkSettings,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device name; None picks the best default.
    pub device: Option<String>,
    /// Frame length sliced by the capture callback, in milliseconds.
    pub frame_ms: u32,
    /// Frame buffer capacity, in frames.
    pub buffer_frames: usize,
}

/// Classifier selection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Path to a recognition model file; None selects the heuristic.
    pub model_path: Option<PathBuf>,
    /// RMS threshold below which a frame counts as silence.
    pub silence_threshold: Option<f32>,
}

/// Viseme smoothing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Smoothing strength in [0.0, 1.0]; 0 = instant, 1 = locked.
    pub strength: f32,
    /// Smoothing history length.
    pub history_len: usize,
}

/// Blink timing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlinkSettings {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub hold_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            frame_ms: defaults::FRAME_MS,
            buffer_frames: defaults::FRAME_BUFFER_CAPACITY,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            strength: defaults::SMOOTHING_STRENGTH,
            history_len: defaults::SMOOTHING_HISTORY_LEN,
        }
    }
}

impl Default for BlinkSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: defaults::BLINK_MIN_INTERVAL.as_millis() as u64,
            max_interval_ms: defaults::BLINK_MAX_INTERVAL.as_millis() as u64,
            hold_ms: defaults::BLINK_HOLD.as_millis() as u64,
        }
    }
}

impl BlinkSettings {
    /// Converts to the blink machine's config.
    pub fn to_blink_config(&self) -> crate::anim::BlinkConfig {
        crate::anim::BlinkConfig {
            interval: std::time::Duration::from_millis(self.min_interval_ms)
                ..=std::time::Duration::from_millis(self.max_interval_ms),
            hold: std::time::Duration::from_millis(self.hold_ms),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields use default values; invalid TOML is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VismicError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                VismicError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or return defaults only when the file is missing.
    ///
    /// A present-but-invalid file is still an error; silently ignoring a
    /// typo'd config is worse than failing loudly.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(VismicError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported variables:
    /// - VISMIC_AUDIO_DEVICE → audio.device
    /// - VISMIC_MODEL_PATH → classifier.model_path
    /// - VISMIC_SMOOTHING → smoothing.strength
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(device) = std::env::var("VISMIC_AUDIO_DEVICE") {
            if !device.is_empty() {
                self.audio.device = Some(device);
            }
        }

        if let Ok(path) = std::env::var("VISMIC_MODEL_PATH") {
            if !path.is_empty() {
                self.classifier.model_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(strength) = std::env::var("VISMIC_SMOOTHING") {
            if let Ok(value) = strength.parse::<f32>() {
                self.smoothing.strength = value;
            }
        }

        self
    }

    /// Validates value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.smoothing.strength) {
            return Err(VismicError::ConfigInvalidValue {
                key: "smoothing.strength".to_string(),
                message: "must be within 0.0..=1.0".to_string(),
            });
        }
        if self.smoothing.history_len == 0 {
            return Err(VismicError::ConfigInvalidValue {
                key: "smoothing.history_len".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.audio.frame_ms == 0 {
            return Err(VismicError::ConfigInvalidValue {
                key: "audio.frame_ms".to_string(),
                message: "must be nonzero".to_string(),
            });
        }
        if self.audio.buffer_frames == 0 {
            return Err(VismicError::ConfigInvalidValue {
                key: "audio.buffer_frames".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.blink.min_interval_ms > self.blink.max_interval_ms {
            return Err(VismicError::ConfigInvalidValue {
                key: "blink.min_interval_ms".to_string(),
                message: "must not exceed blink.max_interval_ms".to_string(),
            });
        }
        if let Some(threshold) = self.classifier.silence_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(VismicError::ConfigInvalidValue {
                    key: "classifier.silence_threshold".to_string(),
                    message: "must be within 0.0..=1.0".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Default configuration file path.
    ///
    /// Returns ~/.config/vismic/config.toml on Linux.
    #[cfg(feature = "cli")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vismic").join("config.toml"))
    }
}
