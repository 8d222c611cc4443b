//! Data types flowing through the monitoring pipeline.

use crate::classify::Classification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A batch of raw call audio handed to the transcription station.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// PCM samples (16-bit signed integers, 16kHz mono).
    pub samples: Vec<i16>,
    /// Timestamp when this chunk was read from the source.
    pub captured_at: Instant,
    /// Sequence number for ordering and gap detection.
    pub sequence: u64,
}

impl AudioChunk {
    pub fn new(samples: Vec<i16>, captured_at: Instant, sequence: u64) -> Self {
        Self {
            samples,
            captured_at,
            sequence,
        }
    }
}

/// Transcribed text for one chunk of call audio.
#[derive(Debug, Clone)]
pub struct TranscriptSegment {
    pub text: String,
    /// Timestamp when transcription completed.
    pub received_at: Instant,
}

impl TranscriptSegment {
    pub fn new(text: String) -> Self {
        Self {
            text,
            received_at: Instant::now(),
        }
    }
}

/// A confirmed scam detection, raised at most once per monitoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// The verdict that crossed the alert threshold.
    pub classification: Classification,
    /// Size of the transcript snapshot the verdict was made on, in characters.
    pub transcript_chars: usize,
    pub raised_at: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(classification: Classification, transcript_chars: usize) -> Self {
        Self {
            classification,
            transcript_chars,
            raised_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_chunk_creation() {
        let samples = vec![100, 200, 300];
        let now = Instant::now();
        let chunk = AudioChunk::new(samples.clone(), now, 7);

        assert_eq!(chunk.samples, samples);
        assert_eq!(chunk.captured_at, now);
        assert_eq!(chunk.sequence, 7);
    }

    #[test]
    fn test_transcript_segment_creation() {
        let segment = TranscriptSegment::new("hello there".to_string());
        assert_eq!(segment.text, "hello there");
        assert!(segment.received_at <= Instant::now());
    }

    #[test]
    fn test_alert_event_json_roundtrip() {
        let alert = AlertEvent::new(
            Classification {
                is_suspicious: true,
                confidence: 0.91,
                reasoning: "test".to_string(),
                timestamp: Utc::now(),
            },
            640,
        );

        let json = serde_json::to_string(&alert).unwrap();
        let back: AlertEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(alert, back);
    }
}
