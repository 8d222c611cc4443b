//! End-to-end scenarios through the public monitoring API: mock audio in,
//! events and persisted status out.

use callwarden::audio::source::{FallbackAudioSource, MockAudioSource};
use callwarden::classify::{KeywordClassifier, MockClassifier};
use callwarden::pipeline::controller::{CallMonitor, MonitorConfig, MonitorState};
use callwarden::status::StatusStore;
use callwarden::stt::MockTranscriber;
use callwarden::{MonitorEvent, StopReason};
use crossbeam_channel::{bounded, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const SCAM_SCRIPT: &[&str] = &[
    "hello am I speaking with the account holder",
    "congratulations you've won a free prize from our sweepstakes department",
    "to claim your prize we need to verify your bank account and social security number",
    "you must act immediately this offer expires within the hour",
];

const FAMILY_CALL: &[&str] = &[
    "hey it's me just checking in before the weekend",
    "dinner is at seven on saturday bring the kids",
    "grandma says hello and wants pictures from the trip",
];

fn fast_config(event_tx: crossbeam_channel::Sender<MonitorEvent>) -> MonitorConfig {
    MonitorConfig {
        chunk_interval: Duration::from_millis(5),
        max_call_duration: Duration::from_secs(30),
        event_tx: Some(event_tx),
        ..Default::default()
    }
}

fn drain_until_stopped(event_rx: &Receiver<MonitorEvent>) -> Vec<MonitorEvent> {
    let deadline = Instant::now() + Duration::from_secs(3);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        match event_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                let done = matches!(event, MonitorEvent::Stopped { .. });
                events.push(event);
                if done {
                    break;
                }
            }
            Err(_) => continue,
        }
    }
    events
}

fn wait_for_alert(event_rx: &Receiver<MonitorEvent>) -> Option<MonitorEvent> {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if let Ok(event) = event_rx.recv_timeout(Duration::from_millis(100)) {
            if matches!(event, MonitorEvent::Alert(_)) {
                return Some(event);
            }
        }
    }
    None
}

fn wait_for_idle(monitor: &CallMonitor) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while monitor.state() != MonitorState::Idle && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
}

/// A scripted scam call flows through capture, transcription, buffering and
/// the keyword classifier, and raises exactly one alert.
#[test]
fn scam_call_raises_single_alert_with_keyword_classifier() {
    let source = MockAudioSource::new().with_samples(vec![1000i16; 800]);
    let transcriber = MockTranscriber::new("scripted").with_script(SCAM_SCRIPT);

    let (event_tx, event_rx) = bounded(64);
    let monitor = CallMonitor::new(
        Box::new(source),
        Arc::new(transcriber),
        Arc::new(KeywordClassifier::new()),
        fast_config(event_tx),
    );

    monitor.start().unwrap();
    let alert = wait_for_alert(&event_rx);
    // Keep the call going long enough that a second alert could have fired
    thread::sleep(Duration::from_millis(200));
    monitor.stop().unwrap();

    let alert = match alert {
        Some(MonitorEvent::Alert(alert)) => alert,
        other => panic!("Expected an alert, got {:?}", other),
    };
    assert!(alert.classification.is_suspicious);
    assert!(alert.classification.confidence > 0.7);
    assert!(alert.classification.reasoning.contains("fraud keyword"));
    assert!(alert.transcript_chars > 0);

    let extra_alerts = event_rx
        .try_iter()
        .filter(|event| matches!(event, MonitorEvent::Alert(_)))
        .count();
    assert_eq!(extra_alerts, 0, "a run raises at most one alert");
}

/// An ordinary conversation produces no alert and the run ends with a
/// Requested stop.
#[test]
fn benign_call_never_alerts() {
    let source = MockAudioSource::new().with_samples(vec![500i16; 800]);
    let transcriber = MockTranscriber::new("scripted").with_script(FAMILY_CALL);

    let (event_tx, event_rx) = bounded(64);
    let monitor = CallMonitor::new(
        Box::new(source),
        Arc::new(transcriber),
        Arc::new(KeywordClassifier::new()),
        fast_config(event_tx),
    );

    monitor.start().unwrap();
    thread::sleep(Duration::from_millis(300));
    monitor.stop().unwrap();

    let events = drain_until_stopped(&event_rx);
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, MonitorEvent::Alert(_))),
        "family call must not trip the classifier"
    );
    assert!(matches!(
        events.last(),
        Some(MonitorEvent::Stopped {
            reason: StopReason::Requested
        })
    ));
}

/// When the call-optimized device is unavailable the monitor runs on the
/// microphone fallback and still detects the scam.
#[test]
fn fallback_source_still_detects_scam() {
    let primary = MockAudioSource::new().with_start_failure();
    let fallback = MockAudioSource::new().with_samples(vec![1000i16; 800]);
    let source = FallbackAudioSource::new(Box::new(primary), Box::new(fallback));
    let transcriber = MockTranscriber::new("scripted").with_script(SCAM_SCRIPT);

    let (event_tx, event_rx) = bounded(64);
    let monitor = CallMonitor::new(
        Box::new(source),
        Arc::new(transcriber),
        Arc::new(KeywordClassifier::new()),
        fast_config(event_tx),
    );

    monitor.start().unwrap();
    let alert = wait_for_alert(&event_rx);
    monitor.stop().unwrap();

    assert!(alert.is_some(), "fallback capture path must still alert");
}

/// The safety timeout winds the run down on its own and the persisted
/// status reflects it, without anyone calling stop().
#[test]
fn safety_timeout_clears_persisted_status() {
    let dir = tempfile::tempdir().unwrap();
    let status = StatusStore::new(Some(dir.path().join("status.json")));

    let source = MockAudioSource::new().with_samples(vec![100i16; 160]);
    let transcriber = MockTranscriber::new("mock").with_response("hello there");

    let (event_tx, event_rx) = bounded(64);
    let config = MonitorConfig {
        chunk_interval: Duration::from_millis(5),
        max_call_duration: Duration::from_millis(60),
        event_tx: Some(event_tx),
        status: status.clone(),
        ..Default::default()
    };
    let monitor = CallMonitor::new(
        Box::new(source),
        Arc::new(transcriber),
        Arc::new(MockClassifier::new("mock")),
        config,
    );

    monitor.start().unwrap();
    assert!(status.current().monitoring);

    let events = drain_until_stopped(&event_rx);
    assert!(matches!(
        events.last(),
        Some(MonitorEvent::Stopped {
            reason: StopReason::Timeout
        })
    ));

    wait_for_idle(&monitor);
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert!(!status.current().monitoring);
}

/// A transcript that never reaches the classification trigger leaves the
/// classifier untouched.
#[test]
fn short_transcript_never_reaches_classifier() {
    let source = MockAudioSource::new().with_samples(vec![100i16; 160]);
    // One short utterance, then silence: the buffer stays under the trigger
    let transcriber = MockTranscriber::new("scripted").with_script(&["hello"]);
    let classifier = Arc::new(MockClassifier::new("counting"));

    let (event_tx, _event_rx) = bounded(64);
    let monitor = CallMonitor::new(
        Box::new(source),
        Arc::new(transcriber),
        classifier.clone(),
        fast_config(event_tx),
    );

    monitor.start().unwrap();
    thread::sleep(Duration::from_millis(200));
    monitor.stop().unwrap();

    assert_eq!(classifier.call_count(), 0);
}

/// Back-to-back runs on one monitor stay independent: the second run gets a
/// fresh transcript buffer and may alert again.
#[test]
fn second_run_can_alert_again() {
    let source = MockAudioSource::new().with_samples(vec![1000i16; 800]);
    let transcriber = MockTranscriber::new("mock").with_response(
        "congratulations you've won a free prize we need to verify your bank account urgently",
    );

    let (event_tx, event_rx) = bounded(64);
    let monitor = CallMonitor::new(
        Box::new(source),
        Arc::new(transcriber),
        Arc::new(KeywordClassifier::new()),
        fast_config(event_tx),
    );

    monitor.start().unwrap();
    assert!(wait_for_alert(&event_rx).is_some());
    monitor.stop().unwrap();
    drain_until_stopped(&event_rx);

    monitor.start().unwrap();
    assert!(
        wait_for_alert(&event_rx).is_some(),
        "alert suppression must reset between runs"
    );
    monitor.stop().unwrap();
}
