use crate::defaults;
use crate::error::{CallwardenError, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Trait for audio source devices.
///
/// This trait allows swapping implementations (real audio device vs mock).
pub trait AudioSource: Send {
    /// Acquire the device and start capturing audio.
    ///
    /// # Returns
    /// Ok(()) if the source started successfully, or an error
    fn start(&mut self) -> Result<()>;

    /// Stop capturing and release the device handle.
    ///
    /// Must be idempotent: calling it on an already-stopped source is a no-op,
    /// and a later `start()` must succeed again.
    fn stop(&mut self) -> Result<()>;

    /// Read audio samples from the source.
    ///
    /// An empty vector means "no data yet" (device warming up, silence gap),
    /// not an error. Returns empty after `stop()`.
    fn read_samples(&mut self) -> Result<Vec<i16>>;
}

/// Configuration for audio source initialization
#[derive(Debug, Clone)]
pub struct AudioSourceConfig {
    pub sample_rate: u32,
}

impl Default for AudioSourceConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

/// Combines a call-optimized primary source with a generic microphone fallback.
///
/// `start()` tries the primary first; if it fails to acquire, the fallback is
/// tried. Only when both fail does the error propagate (fatal for the run).
/// Reads and stops are routed to whichever source actually started.
pub struct FallbackAudioSource {
    primary: Box<dyn AudioSource>,
    fallback: Box<dyn AudioSource>,
    active: Active,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Active {
    None,
    Primary,
    Fallback,
}

impl FallbackAudioSource {
    pub fn new(primary: Box<dyn AudioSource>, fallback: Box<dyn AudioSource>) -> Self {
        Self {
            primary,
            fallback,
            active: Active::None,
        }
    }

    /// True when the fallback source is the one capturing.
    pub fn using_fallback(&self) -> bool {
        self.active == Active::Fallback
    }
}

impl AudioSource for FallbackAudioSource {
    fn start(&mut self) -> Result<()> {
        match self.primary.start() {
            Ok(()) => {
                self.active = Active::Primary;
                Ok(())
            }
            Err(primary_err) => match self.fallback.start() {
                Ok(()) => {
                    eprintln!(
                        "callwarden: call-optimized source unavailable ({primary_err}), using microphone"
                    );
                    self.active = Active::Fallback;
                    Ok(())
                }
                Err(fallback_err) => Err(CallwardenError::AudioDeviceNotFound {
                    device: format!("primary: {primary_err}; fallback: {fallback_err}"),
                }),
            },
        }
    }

    fn stop(&mut self) -> Result<()> {
        let result = match self.active {
            Active::Primary => self.primary.stop(),
            Active::Fallback => self.fallback.stop(),
            Active::None => Ok(()),
        };
        self.active = Active::None;
        result
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        match self.active {
            Active::Primary => self.primary.read_samples(),
            Active::Fallback => self.fallback.read_samples(),
            Active::None => Ok(Vec::new()),
        }
    }
}

/// A phase of samples the mock source plays before moving to the next.
#[derive(Debug, Clone)]
pub struct SamplePhase {
    /// Samples returned by each read in this phase.
    pub samples: Vec<i16>,
    /// Number of reads this phase lasts.
    pub count: u32,
}

/// Mock audio source for testing
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    phases: Vec<SamplePhase>,
    reads: u32,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
    start_count: Arc<AtomicU32>,
    stop_count: Arc<AtomicU32>,
}

impl MockAudioSource {
    /// Create a new mock audio source producing silence forever
    pub fn new() -> Self {
        Self {
            is_started: false,
            phases: vec![SamplePhase {
                samples: vec![0i16; 160],
                count: u32::MAX,
            }],
            reads: 0,
            should_fail_start: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
            start_count: Arc::new(AtomicU32::new(0)),
            stop_count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Configure the mock to return specific samples on every read
    pub fn with_samples(mut self, samples: Vec<i16>) -> Self {
        self.phases = vec![SamplePhase {
            samples,
            count: u32::MAX,
        }];
        self
    }

    /// Configure the mock to play through a sequence of phases, then go silent
    pub fn with_phases(mut self, phases: Vec<SamplePhase>) -> Self {
        self.phases = phases;
        self
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on read
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the audio source is started
    pub fn is_started(&self) -> bool {
        self.is_started
    }

    /// Shared counter of successful `start()` calls (survives moves into the pipeline).
    pub fn start_counter(&self) -> Arc<AtomicU32> {
        self.start_count.clone()
    }

    /// Shared counter of `stop()` calls.
    pub fn stop_counter(&self) -> Arc<AtomicU32> {
        self.stop_count.clone()
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            Err(CallwardenError::AudioCapture {
                message: self.error_message.clone(),
            })
        } else {
            self.is_started = true;
            self.reads = 0;
            self.start_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        self.stop_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.should_fail_read {
            return Err(CallwardenError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        if !self.is_started {
            return Ok(Vec::new());
        }

        let mut remaining = self.reads;
        for phase in &self.phases {
            if remaining < phase.count {
                self.reads = self.reads.saturating_add(1);
                return Ok(phase.samples.clone());
            }
            remaining -= phase.count;
        }

        // Phases exhausted: silence
        Ok(Vec::new())
    }
}
