use crate::error::{CallwardenError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (real engine vs mock).
/// The engine may be slow; callers must assume each call blocks for the
/// duration of one inference.
pub trait Transcriber: Send + Sync {
    /// Transcribe audio samples to text.
    ///
    /// # Arguments
    /// * `audio` - Audio samples as 16-bit PCM at 16kHz mono
    ///
    /// # Returns
    /// Transcribed text (possibly empty when no speech was recognized) or error
    fn transcribe(&self, audio: &[i16]) -> Result<String>;

    /// Get the name of the backing engine/model
    fn model_name(&self) -> &str;

    /// Check if the transcriber is ready
    fn is_ready(&self) -> bool;
}

/// Implement Transcriber for Arc<T> to allow sharing across pipeline runs.
impl<T: Transcriber + ?Sized> Transcriber for Arc<T> {
    fn transcribe(&self, audio: &[i16]) -> Result<String> {
        (**self).transcribe(audio)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock transcriber for testing.
///
/// Plays through a script of responses (one per call, repeating the last),
/// optionally sleeping to simulate a slow engine.
#[derive(Debug)]
pub struct MockTranscriber {
    model_name: String,
    script: Vec<String>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    should_fail: bool,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            script: vec!["mock transcription".to_string()],
            calls: AtomicUsize::new(0),
            delay: None,
            should_fail: false,
        }
    }

    /// Configure the mock to return a single fixed response
    pub fn with_response(mut self, response: &str) -> Self {
        self.script = vec![response.to_string()];
        self
    }

    /// Configure the mock to play through a response script, one per call.
    /// After the script is exhausted, further calls return empty text.
    pub fn with_script(mut self, script: &[&str]) -> Self {
        self.script = script.iter().map(|s| s.to_string()).collect();
        self.script.push(String::new());
        self
    }

    /// Configure the mock to sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Number of transcribe calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, _audio: &[i16]) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.should_fail {
            return Err(CallwardenError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }

        let index = call.min(self.script.len().saturating_sub(1));
        Ok(self.script.get(index).cloned().unwrap_or_default())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
