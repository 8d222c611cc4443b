//! Default configuration constants for callwarden.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz mono is the standard for speech recognition and what every
/// transcription backend in this space expects.
pub const SAMPLE_RATE: u32 = 16000;

/// Interval in milliseconds between audio source reads.
///
/// The capture loop sleeps this long between reads so it never busy-spins.
/// 50ms keeps per-chunk latency low without hammering the device.
pub const CHUNK_INTERVAL_MS: u64 = 50;

/// Minimum accumulated transcript characters before classification is attempted.
pub const TRIGGER_CHARS: usize = 50;

/// Maximum retained transcript characters before the oldest portion is discarded.
pub const CAP_CHARS: usize = 1000;

/// Number of oldest characters discarded when the buffer exceeds the cap.
///
/// Half the cap keeps enough recent context for the classifier while
/// bounding memory. Tune via `DetectionConfig`, not here.
pub const TRIM_CHARS: usize = 500;

/// Minimum classifier confidence for an alert to fire.
///
/// Detections below this are recorded but never surfaced to the user,
/// to avoid alert fatigue from borderline classifications.
pub const ALERT_CONFIDENCE: f32 = 0.7;

/// Maximum monitored call duration in seconds before the pipeline force-stops.
///
/// Safety valve for the case where no call-ended signal ever arrives.
pub const MAX_CALL_SECS: u64 = 300;

/// Consecutive audio read failures tolerated before the capture loop gives up.
pub const MAX_CONSECUTIVE_READ_ERRORS: u32 = 10;

/// Risk score at which the built-in keyword classifier flags a conversation.
pub const RISK_THRESHOLD: f32 = 0.6;

/// Weight of fraud keyword matches in the keyword classifier's risk score.
pub const KEYWORD_WEIGHT: f32 = 0.3;

/// Weight of suspicious phrase matches in the keyword classifier's risk score.
pub const PHRASE_WEIGHT: f32 = 0.4;

/// Weight of urgency/pressure trigger matches in the keyword classifier's risk score.
pub const URGENCY_WEIGHT: f32 = 0.2;
