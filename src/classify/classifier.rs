use crate::error::{CallwardenError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Verdict produced by a spam classifier over a transcript snapshot.
///
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub is_suspicious: bool,
    /// Classifier confidence in [0, 1].
    pub confidence: f32,
    /// Human-readable explanation of the verdict.
    pub reasoning: String,
    pub timestamp: DateTime<Utc>,
}

impl Classification {
    /// A benign verdict with zero confidence.
    pub fn benign(reasoning: &str) -> Self {
        Self {
            is_suspicious: false,
            confidence: 0.0,
            reasoning: reasoning.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Trait for spam/scam classification of conversation text.
///
/// This trait allows swapping implementations (external model vs the built-in
/// keyword heuristic vs mock). Classification may be slow; the pipeline runs
/// it off the transcription path.
pub trait SpamClassifier: Send + Sync {
    /// Classify a transcript snapshot.
    fn classify(&self, text: &str) -> Result<Classification>;

    /// Get the name of the backing classifier
    fn name(&self) -> &str;
}

/// Implement SpamClassifier for Arc<T> to allow sharing with dispatch threads.
impl<T: SpamClassifier + ?Sized> SpamClassifier for Arc<T> {
    fn classify(&self, text: &str) -> Result<Classification> {
        (**self).classify(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock classifier for testing.
///
/// Counts invocations (for the at-most-one-in-flight property tests),
/// records the texts it saw, and supports scripted verdicts, delays,
/// and failure injection.
pub struct MockClassifier {
    name: String,
    verdicts: Vec<Classification>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    delay: Option<Duration>,
    should_fail: bool,
}

impl MockClassifier {
    /// Create a mock that always answers "benign".
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            verdicts: vec![Classification::benign("mock verdict")],
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            delay: None,
            should_fail: false,
        }
    }

    /// Configure a single fixed verdict.
    pub fn with_verdict(mut self, is_suspicious: bool, confidence: f32) -> Self {
        self.verdicts = vec![Classification {
            is_suspicious,
            confidence,
            reasoning: "mock verdict".to_string(),
            timestamp: Utc::now(),
        }];
        self
    }

    /// Configure a script of verdicts, one per call (last one repeats).
    pub fn with_verdict_script(mut self, verdicts: Vec<(bool, f32)>) -> Self {
        self.verdicts = verdicts
            .into_iter()
            .map(|(is_suspicious, confidence)| Classification {
                is_suspicious,
                confidence,
                reasoning: "mock verdict".to_string(),
                timestamp: Utc::now(),
            })
            .collect();
        self
    }

    /// Configure the mock to sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Configure the mock to fail on classify
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Number of classify calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts passed to classify, in call order
    pub fn seen_texts(&self) -> Vec<String> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl SpamClassifier for MockClassifier {
    fn classify(&self, text: &str) -> Result<Classification> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(text.to_string());
        }

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.should_fail {
            return Err(CallwardenError::Classification {
                message: "mock classification failure".to_string(),
            });
        }

        let index = call.min(self.verdicts.len().saturating_sub(1));
        let mut verdict = self.verdicts[index].clone();
        verdict.timestamp = Utc::now();
        Ok(verdict)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
