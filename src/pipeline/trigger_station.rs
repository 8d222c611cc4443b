//! Station that buffers transcript and dispatches debounced classification.

use crate::classify::SpamClassifier;
use crate::events::MonitorEvent;
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::transcript_buffer::TranscriptBuffer;
use crate::pipeline::types::{AlertEvent, TranscriptSegment};
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Terminal pipeline station: accumulates transcript segments and decides
/// when to run spam classification.
///
/// Classification is slow relative to transcription, so each dispatch runs
/// on its own short-lived thread while this station keeps absorbing
/// segments. Two invariants are enforced with atomic flags:
///
/// - at most one classification is in flight at any instant (`pending`)
/// - at most one alert is raised per monitoring run (`alerted`)
///
/// Alerts therefore arrive on the alert channel from classification
/// threads; `process` itself never returns output inline. The runner's
/// output sender just keeps the channel open until the station winds down.
pub struct TriggerStation {
    buffer: TranscriptBuffer,
    classifier: Arc<dyn SpamClassifier>,
    /// Minimum confidence for a suspicious verdict to become an alert.
    alert_confidence: f32,
    pending: Arc<AtomicBool>,
    alerted: Arc<AtomicBool>,
    /// Cleared when the run stops; late verdicts are then discarded.
    running: Arc<AtomicBool>,
    alert_tx: Sender<AlertEvent>,
    /// Optional presentation stream for "listening" transcript previews.
    event_tx: Option<Sender<MonitorEvent>>,
}

/// Characters of transcript tail shown in listening previews.
const PREVIEW_CHARS: usize = 60;

impl TriggerStation {
    pub fn new(
        buffer: TranscriptBuffer,
        classifier: Arc<dyn SpamClassifier>,
        alert_confidence: f32,
        running: Arc<AtomicBool>,
        alert_tx: Sender<AlertEvent>,
        event_tx: Option<Sender<MonitorEvent>>,
    ) -> Self {
        Self {
            buffer,
            classifier,
            alert_confidence,
            pending: Arc::new(AtomicBool::new(false)),
            alerted: Arc::new(AtomicBool::new(false)),
            running,
            alert_tx,
            event_tx,
        }
    }

    fn emit_preview(&self) {
        let Some(tx) = &self.event_tx else {
            return;
        };
        let snapshot = self.buffer.snapshot();
        let tail_start = snapshot
            .char_indices()
            .rev()
            .nth(PREVIEW_CHARS.saturating_sub(1))
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        // Non-blocking: previews are cosmetic and may be dropped
        let _ = tx.try_send(MonitorEvent::Listening {
            preview: snapshot[tail_start..].to_string(),
        });
    }

    /// Flag observed by tests and diagnostics: a classification is in flight.
    pub fn pending_flag(&self) -> Arc<AtomicBool> {
        self.pending.clone()
    }

    /// Flag observed by tests and diagnostics: this run already alerted.
    pub fn alerted_flag(&self) -> Arc<AtomicBool> {
        self.alerted.clone()
    }

    fn dispatch_classification(&self) {
        let snapshot = self.buffer.snapshot();
        let snapshot_chars = self.buffer.char_len();
        let classifier = self.classifier.clone();
        let alert_confidence = self.alert_confidence;
        let pending = self.pending.clone();
        let alerted = self.alerted.clone();
        let running = self.running.clone();
        let alert_tx = self.alert_tx.clone();

        // Detached on purpose: a verdict that outlives the run is discarded
        // by the running check below, and the thread exits right after.
        thread::spawn(move || {
            let verdict = classifier.classify(&snapshot);
            pending.store(false, Ordering::SeqCst);

            match verdict {
                Ok(classification) => {
                    let fires = classification.is_suspicious
                        && classification.confidence > alert_confidence;
                    if fires
                        && running.load(Ordering::SeqCst)
                        && !alerted.swap(true, Ordering::SeqCst)
                    {
                        let alert = AlertEvent::new(classification, snapshot_chars);
                        if alert_tx.send(alert).is_err() {
                            // Run already torn down; the verdict dies here
                            alerted.store(false, Ordering::SeqCst);
                        }
                    }
                }
                Err(e) => {
                    eprintln!("callwarden: classification failed: {}", e);
                }
            }
        });
    }
}

impl Station for TriggerStation {
    type Input = TranscriptSegment;
    type Output = AlertEvent;

    fn process(&mut self, segment: TranscriptSegment) -> Result<Option<AlertEvent>, StationError> {
        self.buffer.append(&segment.text);
        self.emit_preview();

        if self.alerted.load(Ordering::SeqCst) {
            // One alert per run; keep buffering for diagnostics only
            return Ok(None);
        }

        if self.buffer.ready_for_classification()
            && !self.pending.swap(true, Ordering::SeqCst)
        {
            self.dispatch_classification();
        }

        Ok(None)
    }

    fn name(&self) -> &'static str {
        "SpamTrigger"
    }

    fn shutdown(&mut self) {
        self.buffer.clear();
    }
}
