//! Transcription via an external command.
//!
//! Runs a user-configured program per chunk, feeding it a WAV on stdin and
//! reading the transcript from stdout. This keeps the speech-to-text engine
//! out of process: any CLI that speaks WAV-in/text-out works.

use crate::defaults;
use crate::error::{CallwardenError, Result};
use crate::stt::transcriber::Transcriber;
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

/// Speech-to-text through a subprocess.
pub struct CommandTranscriber {
    program: String,
    args: Vec<String>,
    sample_rate: u32,
}

impl CommandTranscriber {
    pub fn new(program: &str, args: &[String]) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
            sample_rate: defaults::SAMPLE_RATE,
        }
    }

    /// Encodes samples as a 16-bit mono WAV in memory.
    fn encode_wav(&self, audio: &[i16]) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(|e| {
                CallwardenError::Transcription {
                    message: format!("Failed to encode WAV: {}", e),
                }
            })?;
            for &sample in audio {
                writer
                    .write_sample(sample)
                    .map_err(|e| CallwardenError::Transcription {
                        message: format!("Failed to encode WAV: {}", e),
                    })?;
            }
            writer
                .finalize()
                .map_err(|e| CallwardenError::Transcription {
                    message: format!("Failed to finalize WAV: {}", e),
                })?;
        }
        Ok(cursor.into_inner())
    }
}

impl Transcriber for CommandTranscriber {
    fn transcribe(&self, audio: &[i16]) -> Result<String> {
        let wav = self.encode_wav(audio)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CallwardenError::Transcription {
                message: format!("Failed to run '{}': {}", self.program, e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(&wav) {
                // Child exited without draining stdin (EPIPE); reap it so a
                // crashing engine cannot leak one zombie per chunk
                drop(stdin);
                let _ = child.kill();
                let _ = child.wait();
                return Err(CallwardenError::Transcription {
                    message: format!("Failed to feed audio to '{}': {}", self.program, e),
                });
            }
            // Drop closes stdin so the child sees EOF
        }

        let output = child
            .wait_with_output()
            .map_err(|e| CallwardenError::Transcription {
                message: format!("'{}' did not finish: {}", self.program, e),
            })?;

        if !output.status.success() {
            return Err(CallwardenError::Transcription {
                message: format!("'{}' exited with {}", self.program, output.status),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.program
    }

    fn is_ready(&self) -> bool {
        !self.program.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> CommandTranscriber {
        CommandTranscriber::new("sh", &["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_silent_program_gives_empty_transcript() {
        let transcriber = shell("cat >/dev/null");
        let text = transcriber.transcribe(&[0i16; 160]).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_stdout_becomes_transcript() {
        let transcriber = shell("cat >/dev/null; echo hello from stt");
        let text = transcriber.transcribe(&[100i16; 160]).unwrap();
        assert_eq!(text, "hello from stt");
    }

    #[test]
    fn test_missing_program_is_error() {
        let transcriber = CommandTranscriber::new("/nonexistent/callwarden-stt", &[]);
        match transcriber.transcribe(&[0i16; 10]) {
            Err(CallwardenError::Transcription { message }) => {
                assert!(message.contains("Failed to run"));
            }
            _ => panic!("Expected Transcription error"),
        }
    }

    #[test]
    fn test_failing_program_is_error() {
        let transcriber = shell("cat >/dev/null; exit 3");
        match transcriber.transcribe(&[0i16; 10]) {
            Err(CallwardenError::Transcription { message }) => {
                assert!(message.contains("exited with"));
            }
            _ => panic!("Expected Transcription error"),
        }
    }

    /// Count direct children of this process sitting in zombie state.
    fn zombie_children() -> usize {
        let own_pid = std::process::id();
        let mut count = 0;
        if let Ok(entries) = std::fs::read_dir("/proc") {
            for entry in entries.flatten() {
                let Ok(stat) = std::fs::read_to_string(entry.path().join("stat")) else {
                    continue;
                };
                // /proc/<pid>/stat: pid (comm) state ppid ...
                let Some(after_comm) = stat.rsplit(')').next() else {
                    continue;
                };
                let mut fields = after_comm.split_whitespace();
                let state = fields.next();
                let ppid = fields.next().and_then(|p| p.parse::<u32>().ok());
                if state == Some("Z") && ppid == Some(own_pid) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_failed_stdin_write_reaps_child() {
        // `false` exits without reading; a WAV larger than the pipe buffer
        // makes the stdin write fail with EPIPE
        let transcriber = CommandTranscriber::new("false", &[]);
        let oversized = vec![0i16; 200_000];

        for _ in 0..5 {
            assert!(transcriber.transcribe(&oversized).is_err());
        }

        assert_eq!(zombie_children(), 0, "failed children must be reaped");
    }

    #[test]
    fn test_encode_wav_produces_riff_header() {
        let transcriber = CommandTranscriber::new("true", &[]);
        let wav = transcriber.encode_wav(&[1i16, 2, 3]).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
    }

    #[test]
    fn test_model_name_is_program() {
        let transcriber = CommandTranscriber::new("whisper-cli", &[]);
        assert_eq!(transcriber.model_name(), "whisper-cli");
        assert!(transcriber.is_ready());
    }
}
