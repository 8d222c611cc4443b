//! Lifecycle controller for call monitoring runs.

use crate::audio::source::AudioSource;
use crate::classify::SpamClassifier;
use crate::config::Config;
use crate::defaults;
use crate::error::{CallwardenError, Result};
use crate::events::{MonitorEvent, StopReason};
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::station::StationRunner;
use crate::pipeline::transcriber_station::TranscriberStation;
use crate::pipeline::transcript_buffer::TranscriptBuffer;
use crate::pipeline::trigger_station::TriggerStation;
use crate::pipeline::types::AudioChunk;
use crate::status::StatusStore;
use crate::stt::Transcriber;
use chrono::Utc;
use crossbeam_channel::{Sender, bounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Lifecycle states of a call monitor.
///
/// Transitions: Idle → Recording (start), Recording → Stopping (stop),
/// Stopping → Idle (teardown complete). A run that dies on its own
/// (timeout, audio failure, pipeline failure) goes straight back to Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Recording,
    Stopping,
}

/// Configuration for a call monitor.
#[derive(Clone)]
pub struct MonitorConfig {
    /// Pacing between audio source reads.
    pub chunk_interval: Duration,
    /// Safety limit: a run force-stops after this long.
    pub max_call_duration: Duration,
    /// Minimum buffered characters before classification is attempted.
    pub trigger_chars: usize,
    /// Maximum buffered characters before the oldest portion is dropped.
    pub cap_chars: usize,
    /// Characters dropped from the front when the cap is exceeded.
    pub trim_chars: usize,
    /// Minimum classifier confidence for an alert.
    pub alert_confidence: f32,
    /// Buffer size of the transcript segment channel.
    pub segment_buffer: usize,
    /// Optional event sender for streaming consumers (non-blocking).
    pub event_tx: Option<Sender<MonitorEvent>>,
    /// Persistent status writer.
    pub status: StatusStore,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            chunk_interval: Duration::from_millis(defaults::CHUNK_INTERVAL_MS),
            max_call_duration: Duration::from_secs(defaults::MAX_CALL_SECS),
            trigger_chars: defaults::TRIGGER_CHARS,
            cap_chars: defaults::CAP_CHARS,
            trim_chars: defaults::TRIM_CHARS,
            alert_confidence: defaults::ALERT_CONFIDENCE,
            segment_buffer: 16,
            event_tx: None,
            status: StatusStore::disabled(),
        }
    }
}

impl MonitorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_interval: Duration::from_millis(config.audio.chunk_interval_ms),
            max_call_duration: Duration::from_secs(config.detection.max_call_secs),
            trigger_chars: config.detection.trigger_chars,
            cap_chars: config.detection.cap_chars,
            trim_chars: config.detection.trim_chars,
            alert_confidence: config.detection.alert_confidence,
            status: StatusStore::new(config.status.path.clone()),
            ..Default::default()
        }
    }
}

/// Shared handles of the run currently in flight.
struct ActiveRun {
    running: Arc<AtomicBool>,
    /// Set exactly once by whichever side finishes the teardown (explicit
    /// stop or the run's own supervisor); the winner emits the Stopped
    /// event and persists the final status.
    torn_down: Arc<AtomicBool>,
    stop_reason: Arc<Mutex<Option<StopReason>>>,
}

struct MonitorInner {
    state: MonitorState,
    run: Option<ActiveRun>,
}

/// Orchestrates call monitoring: owns the audio source, spawns the
/// transcription and trigger stations per run, and enforces the lifecycle
/// state machine.
///
/// `start()` and `stop()` are idempotent. Thread-safe; share via `Arc`.
pub struct CallMonitor {
    inner: Arc<Mutex<MonitorInner>>,
    source: Arc<Mutex<Box<dyn AudioSource>>>,
    transcriber: Arc<dyn Transcriber>,
    classifier: Arc<dyn SpamClassifier>,
    config: MonitorConfig,
    error_reporter: Arc<dyn ErrorReporter>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl CallMonitor {
    pub fn new(
        source: Box<dyn AudioSource>,
        transcriber: Arc<dyn Transcriber>,
        classifier: Arc<dyn SpamClassifier>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MonitorInner {
                state: MonitorState::Idle,
                run: None,
            })),
            source: Arc::new(Mutex::new(source)),
            transcriber,
            classifier,
            config,
            error_reporter: Arc::new(LogReporter),
            threads: Mutex::new(Vec::new()),
        }
    }

    /// Sets a custom error reporter for station errors.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    pub fn state(&self) -> MonitorState {
        self.inner
            .lock()
            .map(|inner| inner.state)
            .unwrap_or(MonitorState::Idle)
    }

    pub fn is_monitoring(&self) -> bool {
        self.state() == MonitorState::Recording
    }

    /// Telephony integration point: a call just began.
    pub fn on_call_started(&self) -> Result<()> {
        self.start()
    }

    /// Telephony integration point: the call ended.
    pub fn on_call_ended(&self) -> Result<()> {
        self.stop()
    }

    /// Starts a monitoring run.
    ///
    /// Idempotent while Recording. Returns `PipelineBusy` while a previous
    /// run is still stopping. Failure to acquire any audio source is fatal
    /// for the run: the monitor stays Idle and the error propagates.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.lock_inner()?;
        match inner.state {
            MonitorState::Recording => return Ok(()),
            MonitorState::Stopping => {
                return Err(CallwardenError::PipelineBusy {
                    message: "previous monitoring run is still stopping".to_string(),
                });
            }
            MonitorState::Idle => {}
        }

        // Collect leftovers from a run that tore itself down
        self.reap_finished_threads();

        {
            let mut source = self
                .source
                .lock()
                .map_err(|_| CallwardenError::Other("audio source lock poisoned".to_string()))?;
            source.start()?;
        }

        if let Err(e) = self.config.status.set_monitoring(true) {
            eprintln!("callwarden: failed to persist monitoring status: {e}");
        }
        // Emitted before any station runs so consumers always see Started
        // ahead of the first listening preview
        self.emit(MonitorEvent::Started { at: Utc::now() });

        let running = Arc::new(AtomicBool::new(true));
        let torn_down = Arc::new(AtomicBool::new(false));
        let stop_reason: Arc<Mutex<Option<StopReason>>> = Arc::new(Mutex::new(None));

        let (chunk_tx, chunk_rx) = bounded::<AudioChunk>(1);
        let (segment_tx, segment_rx) = bounded(self.config.segment_buffer);
        let (alert_tx, alert_rx) = bounded(4);

        let transcriber_runner = StationRunner::spawn(
            TranscriberStation::new(self.transcriber.clone()),
            chunk_rx,
            segment_tx,
            self.error_reporter.clone(),
        );

        let trigger_station = TriggerStation::new(
            TranscriptBuffer::new(
                self.config.trigger_chars,
                self.config.cap_chars,
                self.config.trim_chars,
            ),
            self.classifier.clone(),
            self.config.alert_confidence,
            running.clone(),
            alert_tx.clone(),
            self.config.event_tx.clone(),
        );
        let trigger_runner = StationRunner::spawn(
            trigger_station,
            segment_rx,
            alert_tx,
            self.error_reporter.clone(),
        );

        let capture_handle = self.spawn_capture_loop(
            chunk_tx,
            running.clone(),
            stop_reason.clone(),
        );
        let supervisor_handle = self.spawn_supervisor(
            alert_rx,
            running.clone(),
            torn_down.clone(),
            stop_reason.clone(),
        );

        let mut threads = vec![capture_handle, supervisor_handle];
        threads.push(thread::spawn(move || {
            if let Err(msg) = transcriber_runner.join() {
                eprintln!("callwarden: {msg}");
            }
        }));
        threads.push(thread::spawn(move || {
            if let Err(msg) = trigger_runner.join() {
                eprintln!("callwarden: {msg}");
            }
        }));
        if let Ok(mut stored) = self.threads.lock() {
            stored.extend(threads);
        }

        inner.state = MonitorState::Recording;
        inner.run = Some(ActiveRun {
            running,
            torn_down,
            stop_reason,
        });
        Ok(())
    }

    /// Stops the active run and waits (bounded) for its threads.
    ///
    /// Idempotent: stopping an Idle monitor is a no-op, and a concurrent
    /// stop simply returns once the first one has claimed the teardown.
    pub fn stop(&self) -> Result<()> {
        let run = {
            let mut inner = self.lock_inner()?;
            match inner.state {
                MonitorState::Idle => {
                    drop(inner);
                    self.reap_finished_threads();
                    return Ok(());
                }
                MonitorState::Stopping => return Ok(()),
                MonitorState::Recording => {
                    inner.state = MonitorState::Stopping;
                    inner.run.take()
                }
            }
        };

        let mut owns_teardown = false;
        let mut reason = StopReason::Requested;
        if let Some(run) = &run {
            run.running.store(false, Ordering::SeqCst);
            owns_teardown = !run.torn_down.swap(true, Ordering::SeqCst);
            if let Ok(slot) = run.stop_reason.lock() {
                if let Some(recorded) = *slot {
                    reason = recorded;
                }
            }
        }

        self.join_threads_with_deadline(Duration::from_secs(1));

        // The capture loop normally releases the device itself; this covers
        // the case where it was detached at the deadline.
        if let Ok(mut source) = self.source.lock() {
            if let Err(e) = source.stop() {
                eprintln!("callwarden: failed to stop audio source: {e}");
            }
        }

        {
            let mut inner = self.lock_inner()?;
            inner.state = MonitorState::Idle;
        }

        if owns_teardown {
            if let Err(e) = self.config.status.set_monitoring(false) {
                eprintln!("callwarden: failed to persist monitoring status: {e}");
            }
            self.emit(MonitorEvent::Stopped { reason });
        }
        Ok(())
    }

    fn spawn_capture_loop(
        &self,
        chunk_tx: Sender<AudioChunk>,
        running: Arc<AtomicBool>,
        stop_reason: Arc<Mutex<Option<StopReason>>>,
    ) -> JoinHandle<()> {
        let source = self.source.clone();
        let chunk_interval = self.config.chunk_interval;
        let deadline = Instant::now() + self.config.max_call_duration;

        thread::spawn(move || {
            let mut consecutive_errors: u32 = 0;
            let mut sequence: u64 = 0;

            while running.load(Ordering::SeqCst) {
                if Instant::now() >= deadline {
                    eprintln!("callwarden: maximum call duration reached, stopping capture");
                    if let Ok(mut slot) = stop_reason.lock() {
                        *slot = Some(StopReason::Timeout);
                    }
                    running.store(false, Ordering::SeqCst);
                    break;
                }

                let read = match source.lock() {
                    Ok(mut source) => source.read_samples(),
                    Err(_) => break,
                };

                match read {
                    Ok(samples) => {
                        consecutive_errors = 0;
                        if !samples.is_empty() {
                            let chunk = AudioChunk::new(samples, Instant::now(), sequence);
                            sequence += 1;
                            // Lossy at this boundary: if the transcriber has
                            // not drained the previous chunk, this one is
                            // dropped rather than stalling capture.
                            match chunk_tx.try_send(chunk) {
                                Ok(()) | Err(crossbeam_channel::TrySendError::Full(_)) => {}
                                Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                                    // Transcription station died; nothing
                                    // downstream can consume audio anymore
                                    if let Ok(mut slot) = stop_reason.lock() {
                                        slot.get_or_insert(StopReason::PipelineFailure);
                                    }
                                    running.store(false, Ordering::SeqCst);
                                    break;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        if consecutive_errors >= defaults::MAX_CONSECUTIVE_READ_ERRORS {
                            eprintln!(
                                "callwarden: audio capture failed {consecutive_errors} times in a row: {e}"
                            );
                            if let Ok(mut slot) = stop_reason.lock() {
                                *slot = Some(StopReason::AudioFailure);
                            }
                            running.store(false, Ordering::SeqCst);
                            break;
                        }
                    }
                }

                thread::sleep(chunk_interval);
            }

            // Release the device so the next run can reacquire it
            if let Ok(mut source) = source.lock() {
                if let Err(e) = source.stop() {
                    eprintln!("callwarden: failed to stop audio source: {e}");
                }
            }
            // chunk_tx drops here, draining the pipeline behind it
        })
    }

    /// The supervisor forwards alerts while the run lives, then finishes the
    /// teardown if nobody explicitly requested the stop (timeout, audio
    /// failure, or a station death).
    fn spawn_supervisor(
        &self,
        alert_rx: crossbeam_channel::Receiver<crate::pipeline::types::AlertEvent>,
        running: Arc<AtomicBool>,
        torn_down: Arc<AtomicBool>,
        stop_reason: Arc<Mutex<Option<StopReason>>>,
    ) -> JoinHandle<()> {
        let inner = self.inner.clone();
        let status = self.config.status.clone();
        let event_tx = self.config.event_tx.clone();

        thread::spawn(move || {
            // Ends when every alert sender is gone: both stations exited and
            // no classification thread is still holding a clone.
            for alert in alert_rx.iter() {
                if let Err(e) = status.record_alert(&alert) {
                    eprintln!("callwarden: failed to persist alert: {e}");
                }
                Self::emit_to(&event_tx, MonitorEvent::Alert(alert));
            }

            if !torn_down.swap(true, Ordering::SeqCst) {
                running.store(false, Ordering::SeqCst);
                if let Ok(mut inner) = inner.lock() {
                    inner.state = MonitorState::Idle;
                    inner.run = None;
                }
                if let Err(e) = status.set_monitoring(false) {
                    eprintln!("callwarden: failed to persist monitoring status: {e}");
                }
                let reason = stop_reason
                    .lock()
                    .ok()
                    .and_then(|slot| *slot)
                    .unwrap_or(StopReason::PipelineFailure);
                Self::emit_to(&event_tx, MonitorEvent::Stopped { reason });
            }
        })
    }

    fn emit(&self, event: MonitorEvent) {
        Self::emit_to(&self.config.event_tx, event);
    }

    fn emit_to(event_tx: &Option<Sender<MonitorEvent>>, event: MonitorEvent) {
        if let Some(tx) = event_tx {
            // Non-blocking: a slow consumer loses events, never stalls the run
            let _ = tx.try_send(event);
        }
    }

    fn lock_inner(&self) -> Result<std::sync::MutexGuard<'_, MonitorInner>> {
        self.inner
            .lock()
            .map_err(|_| CallwardenError::Other("monitor state lock poisoned".to_string()))
    }

    fn reap_finished_threads(&self) {
        if let Ok(mut threads) = self.threads.lock() {
            let mut remaining = Vec::new();
            for handle in threads.drain(..) {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        eprintln!("callwarden: monitor thread panicked");
                    }
                } else {
                    remaining.push(handle);
                }
            }
            *threads = remaining;
        }
    }

    /// Joins run threads, polling until the deadline; stragglers are
    /// detached and die with the process.
    fn join_threads_with_deadline(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        let poll_interval = Duration::from_millis(50);

        loop {
            self.reap_finished_threads();

            let remaining = self.threads.lock().map(|t| t.len()).unwrap_or(0);
            if remaining == 0 {
                break;
            }

            if Instant::now() >= deadline {
                eprintln!(
                    "callwarden: shutdown timeout — {remaining} thread(s) still running, detaching"
                );
                if let Ok(mut threads) = self.threads.lock() {
                    threads.clear();
                }
                break;
            }

            thread::sleep(poll_interval);
        }
    }
}
