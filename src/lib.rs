//! callwarden - Real-time scam call monitoring
//!
//! Captures call audio, transcribes it through an external speech-to-text
//! engine, and raises an alert when a spam classifier flags the
//! conversation with enough confidence.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod status;
pub mod stt;

// Core trait seams (source → transcribe → classify)
pub use audio::source::AudioSource;
pub use classify::{Classification, SpamClassifier};
pub use stt::transcriber::Transcriber;

// Monitoring lifecycle
pub use pipeline::controller::{CallMonitor, MonitorConfig, MonitorState};
pub use pipeline::types::AlertEvent;

// Error handling
pub use error::{CallwardenError, Result};

// Config and persistence
pub use config::Config;
pub use events::{MonitorEvent, StopReason};
pub use status::{StatusFile, StatusStore};

// Station framework (for advanced users)
pub use pipeline::error::{ErrorReporter, StationError};
pub use pipeline::station::Station;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
