//! Station that turns audio chunks into transcript segments.

use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::{AudioChunk, TranscriptSegment};
use crate::stt::transcriber::Transcriber;
use std::sync::Arc;

/// Feeds each audio chunk through the speech-to-text engine.
///
/// Silent results are filtered out so the downstream trigger only sees
/// actual speech. Transcription trouble only ever loses the chunk at hand:
/// a failed call and a not-ready engine are both recoverable, so the run
/// keeps capturing until the engine comes back or the safety timeout ends
/// it. Only audio-source failure tears a run down.
pub struct TranscriberStation {
    transcriber: Arc<dyn Transcriber>,
}

impl TranscriberStation {
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self { transcriber }
    }
}

impl Station for TranscriberStation {
    type Input = AudioChunk;
    type Output = TranscriptSegment;

    fn process(&mut self, chunk: AudioChunk) -> Result<Option<TranscriptSegment>, StationError> {
        if chunk.samples.is_empty() {
            return Ok(None);
        }

        if !self.transcriber.is_ready() {
            return Err(StationError::Recoverable(
                "transcription engine is not available".to_string(),
            ));
        }

        let text = self
            .transcriber
            .transcribe(&chunk.samples)
            .map_err(|e| StationError::Recoverable(format!("transcription failed: {}", e)))?;

        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        Ok(Some(TranscriptSegment::new(text.to_string())))
    }

    fn name(&self) -> &'static str {
        "Transcriber"
    }
}
