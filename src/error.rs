//! Error types for callwarden.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CallwardenError {
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

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Transcription errors
    #[error("Transcription error: {message}")]
    Transcription { message: String },

    // Classification errors
    #[error("Classification error: {message}")]
    Classification { message: String },

    // Pipeline lifecycle errors
    #[error("Pipeline is busy: {message}")]
    PipelineBusy { message: String },

    // Status file errors
    #[error("Status persistence failed: {message}")]
    Status { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, CallwardenError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = CallwardenError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = CallwardenError::ConfigInvalidValue {
            key: "cap_chars".to_string(),
            message: "must exceed trigger_chars".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for cap_chars: must exceed trigger_chars"
        );
    }

    #[test]
    fn test_audio_device_not_found_display() {
        let error = CallwardenError::AudioDeviceNotFound {
            device: "default".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: default");
    }

    #[test]
    fn test_audio_capture_display() {
        let error = CallwardenError::AudioCapture {
            message: "buffer overflow".to_string(),
        };
        assert_eq!(error.to_string(), "Audio capture failed: buffer overflow");
    }

    #[test]
    fn test_transcription_display() {
        let error = CallwardenError::Transcription {
            message: "backend unavailable".to_string(),
        };
        assert_eq!(error.to_string(), "Transcription error: backend unavailable");
    }

    #[test]
    fn test_classification_display() {
        let error = CallwardenError::Classification {
            message: "model timeout".to_string(),
        };
        assert_eq!(error.to_string(), "Classification error: model timeout");
    }

    #[test]
    fn test_pipeline_busy_display() {
        let error = CallwardenError::PipelineBusy {
            message: "previous run still stopping".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Pipeline is busy: previous run still stopping"
        );
    }

    #[test]
    fn test_other_display() {
        let error = CallwardenError::Other("unexpected error".to_string());
        assert_eq!(error.to_string(), "unexpected error");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: CallwardenError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: CallwardenError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<CallwardenError>();
        assert_sync::<CallwardenError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
