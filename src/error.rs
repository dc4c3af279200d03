//! Error types for vismic.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VismicError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture permission denied: {message}")]
    AudioPermissionDenied { message: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Classifier errors
    #[error("Classifier model not found at {path}")]
    ClassifierModelNotFound { path: String },

    #[error("Classifier model is invalid: {message}")]
    ClassifierModelInvalid { message: String },

    #[error("Classification failed: {message}")]
    Classification { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VismicError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = VismicError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = VismicError::ConfigInvalidValue {
            key: "smoothing.strength".to_string(),
            message: "must be within 0.0..=1.0".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for smoothing.strength: must be within 0.0..=1.0"
        );
    }

    #[test]
    fn test_audio_device_not_found_display() {
        let error = VismicError::AudioDeviceNotFound {
            device: "default".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: default");
    }

    #[test]
    fn test_audio_permission_denied_display() {
        let error = VismicError::AudioPermissionDenied {
            message: "microphone access blocked".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Audio capture permission denied: microphone access blocked"
        );
    }

    #[test]
    fn test_classifier_model_not_found_display() {
        let error = VismicError::ClassifierModelNotFound {
            path: "/models/visemes.json".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Classifier model not found at /models/visemes.json"
        );
    }

    #[test]
    fn test_classification_display() {
        let error = VismicError::Classification {
            message: "empty frame".to_string(),
        };
        assert_eq!(error.to_string(), "Classification failed: empty frame");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: VismicError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: VismicError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<VismicError>();
        assert_sync::<VismicError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
