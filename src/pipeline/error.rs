//! Error classification and reporting for pipeline stations.

use std::fmt;

/// Errors raised while a station processes one item.
///
/// The distinction drives the station loop: recoverable errors are reported
/// and the next item is processed, fatal errors end the run.
#[derive(Debug, Clone)]
pub enum StationError {
    /// The item was lost but the station can keep going (e.g. one chunk
    /// failed to transcribe).
    Recoverable(String),
    /// The station cannot continue (e.g. its collaborator is gone).
    Fatal(String),
}

impl StationError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StationError::Fatal(_))
    }
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationError::Recoverable(msg) => write!(f, "Recoverable error: {}", msg),
            StationError::Fatal(msg) => write!(f, "Fatal error: {}", msg),
        }
    }
}

impl std::error::Error for StationError {}

/// Trait for reporting station errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a station.
    fn report(&self, station: &str, error: &StationError);
}

/// Error reporter that logs to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, station: &str, error: &StationError) {
        eprintln!("callwarden: [{}] {}", station, error);
    }
}
