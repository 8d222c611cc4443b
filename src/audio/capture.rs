//! Real audio capture using CPAL (Cross-Platform Audio Library).

use crate::audio::source::{AudioSource, FallbackAudioSource};
use crate::defaults;
use crate::error::{CallwardenError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
/// when probing audio backends. The messages are harmless but confusing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Device name patterns that indicate a call-optimized capture path
/// (communications endpoints, headsets, telephony routing).
const CALL_DEVICE_PATTERNS: &[&str] = &["voice", "comm", "headset", "handsfree", "telephony"];

/// Device name patterns to filter out (not useful for call capture).
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "Digital Output",
    "HDMI",
    "S/PDIF",
];

fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

fn is_call_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    CALL_DEVICE_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

/// List all available audio input devices, call-capable ones marked.
///
/// # Errors
/// Returns `CallwardenError::AudioCapture` if device enumeration fails.
pub fn list_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.input_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| CallwardenError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            if should_filter_device(&name) {
                continue;
            }
            if is_call_device(&name) {
                device_names.push(format!("{} [call]", name));
            } else {
                device_names.push(name);
            }
        }
    }

    Ok(device_names)
}

/// Find an input device whose name suggests a call-optimized capture path.
fn find_call_device() -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if let Ok(name) = device.name() {
                    if is_call_device(&name) && !should_filter_device(&name) {
                        return Ok(device);
                    }
                }
            }
        }

        Err(CallwardenError::AudioDeviceNotFound {
            device: "call-optimized input".to_string(),
        })
    })
}

/// The system default input device (generic microphone).
fn find_default_device() -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        cpal::default_host()
            .default_input_device()
            .ok_or_else(|| CallwardenError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}

/// Find an input device by exact name.
fn find_named_device(name: &str) -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| CallwardenError::AudioCapture {
                message: format!("Failed to enumerate devices: {}", e),
            })?;

        for device in devices {
            if let Ok(dev_name) = device.name() {
                if dev_name == name {
                    return Ok(device);
                }
            }
        }

        Err(CallwardenError::AudioDeviceNotFound {
            device: name.to_string(),
        })
    })
}

/// Build the standard capture source for a monitored call.
///
/// When `device_name` is given, that device is used alone. Otherwise a
/// call-optimized device is tried first with the system default microphone
/// as fallback; both failing makes the pipeline's `start()` fatal.
pub fn open_call_source(device_name: Option<&str>) -> Result<Box<dyn AudioSource>> {
    if let Some(name) = device_name {
        return Ok(Box::new(CpalAudioSource::with_device(find_named_device(
            name,
        )?)));
    }

    let primary = CpalAudioSource::new(find_call_device);
    let fallback = CpalAudioSource::new(find_default_device);
    Ok(Box::new(FallbackAudioSource::new(
        Box::new(primary),
        Box::new(fallback),
    )))
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only accessed through the Mutex in CpalAudioSource,
/// so it never crosses thread boundaries unsynchronized.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Real audio capture implementation using CPAL.
///
/// Captures 16-bit PCM audio at 16kHz mono. The device is acquired lazily in
/// `start()` so a `FallbackAudioSource` can probe alternatives without holding
/// handles it never uses. Tries an i16 stream first, then f32 with software
/// conversion.
pub struct CpalAudioSource {
    locate: fn() -> Result<cpal::Device>,
    device: Option<cpal::Device>,
    stream: Mutex<Option<SendableStream>>,
    buffer: Arc<Mutex<Vec<i16>>>,
    sample_rate: u32,
}

impl CpalAudioSource {
    /// Create a source that locates its device via `locate` on `start()`.
    pub fn new(locate: fn() -> Result<cpal::Device>) -> Self {
        Self {
            locate,
            device: None,
            stream: Mutex::new(None),
            buffer: Arc::new(Mutex::new(Vec::new())),
            sample_rate: defaults::SAMPLE_RATE,
        }
    }

    /// Create a source bound to an already-located device.
    pub fn with_device(device: cpal::Device) -> Self {
        Self {
            locate: find_default_device,
            device: Some(device),
            stream: Mutex::new(None),
            buffer: Arc::new(Mutex::new(Vec::new())),
            sample_rate: defaults::SAMPLE_RATE,
        }
    }

    fn build_stream(&self, device: &cpal::Device) -> Result<cpal::Stream> {
        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            eprintln!("callwarden: audio stream error: {}", err);
        };

        // i16/16kHz/mono — PipeWire/PulseAudio convert transparently
        let buffer = Arc::clone(&self.buffer);
        if let Ok(stream) = device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend_from_slice(data);
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // f32/16kHz/mono — for devices that only expose float formats
        let buffer = Arc::clone(&self.buffer);
        device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend(
                            data.iter()
                                .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                        );
                    }
                },
                err_callback,
                None,
            )
            .map_err(|e| CallwardenError::AudioCapture {
                message: format!("Failed to build input stream: {}", e),
            })
    }
}

impl AudioSource for CpalAudioSource {
    fn start(&mut self) -> Result<()> {
        {
            let guard = self.stream.lock().map_err(|e| CallwardenError::AudioCapture {
                message: format!("Failed to lock stream: {}", e),
            })?;
            if guard.is_some() {
                return Ok(()); // Already started
            }
        }

        if self.device.is_none() {
            self.device = Some((self.locate)()?);
        }
        let device = match self.device.as_ref() {
            Some(d) => d,
            None => unreachable!("device populated above"),
        };

        let stream = self.build_stream(device)?;
        stream.play().map_err(|e| CallwardenError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }

        let mut guard = self.stream.lock().map_err(|e| CallwardenError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        *guard = Some(SendableStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut guard = self.stream.lock().map_err(|e| CallwardenError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;

        // Dropping the stream releases the device handle so a later start()
        // (possibly from a new pipeline run) can reacquire it.
        if let Some(stream) = guard.take() {
            let _ = stream.0.pause();
        }
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        let mut buf = self.buffer.lock().map_err(|e| CallwardenError::AudioCapture {
            message: format!("Failed to lock buffer: {}", e),
        })?;
        Ok(std::mem::take(&mut *buf))
    }
}
