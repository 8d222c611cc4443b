use crate::defaults;
use crate::error::{CallwardenError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub stt: SttConfig,
    pub detection: DetectionConfig,
    pub status: StatusConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    /// Milliseconds between audio source reads.
    pub chunk_interval_ms: u64,
}

/// External speech-to-text command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SttConfig {
    /// Program run per audio chunk: WAV on stdin, transcript on stdout.
    pub command: Option<String>,
    /// Extra arguments for the program.
    pub args: Vec<String>,
}

/// Transcript buffering and classification policy.
///
/// The trigger/cap/trim numbers are heuristics, so they live in config
/// rather than being hard-coded at use sites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum buffered characters before classification is attempted.
    pub trigger_chars: usize,
    /// Maximum buffered characters before the oldest portion is dropped.
    pub cap_chars: usize,
    /// Characters dropped from the front when the cap is exceeded.
    pub trim_chars: usize,
    /// Minimum classifier confidence for an alert.
    pub alert_confidence: f32,
    /// Force-stop a monitored call after this many seconds.
    pub max_call_secs: u64,
}

/// Persisted monitoring status flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StatusConfig {
    /// Where the JSON status flag is written. None disables persistence.
    pub path: Option<PathBuf>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            chunk_interval_ms: defaults::CHUNK_INTERVAL_MS,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            trigger_chars: defaults::TRIGGER_CHARS,
            cap_chars: defaults::CAP_CHARS,
            trim_chars: defaults::TRIM_CHARS,
            alert_confidence: defaults::ALERT_CONFIDENCE,
            max_call_secs: defaults::MAX_CALL_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CallwardenError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                CallwardenError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Invalid TOML or invalid values still surface as errors.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(CallwardenError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - CALLWARDEN_AUDIO_DEVICE → audio.device
    /// - CALLWARDEN_STT_COMMAND → stt.command
    /// - CALLWARDEN_STATUS_PATH → status.path
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(device) = std::env::var("CALLWARDEN_AUDIO_DEVICE") {
            if !device.is_empty() {
                self.audio.device = Some(device);
            }
        }

        if let Ok(command) = std::env::var("CALLWARDEN_STT_COMMAND") {
            if !command.is_empty() {
                self.stt.command = Some(command);
            }
        }

        if let Ok(path) = std::env::var("CALLWARDEN_STATUS_PATH") {
            if !path.is_empty() {
                self.status.path = Some(PathBuf::from(path));
            }
        }

        self
    }

    /// Check cross-field invariants of the detection policy.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        if d.trigger_chars == 0 {
            return Err(CallwardenError::ConfigInvalidValue {
                key: "detection.trigger_chars".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if d.cap_chars <= d.trigger_chars {
            return Err(CallwardenError::ConfigInvalidValue {
                key: "detection.cap_chars".to_string(),
                message: "must exceed trigger_chars".to_string(),
            });
        }
        if d.trim_chars == 0 || d.trim_chars >= d.cap_chars {
            return Err(CallwardenError::ConfigInvalidValue {
                key: "detection.trim_chars".to_string(),
                message: "must be positive and below cap_chars".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&d.alert_confidence) {
            return Err(CallwardenError::ConfigInvalidValue {
                key: "detection.alert_confidence".to_string(),
                message: "must be within [0, 1]".to_string(),
            });
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/callwarden/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("callwarden").join("config.toml"))
    }
}
