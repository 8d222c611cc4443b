//! Command-line interface for callwarden
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Real-time scam call monitoring
#[derive(Parser, Debug)]
#[command(name = "callwarden", version, about = "Real-time scam call monitoring")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress event output (alerts still persist to the status file)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Audio input device (exact name from `callwarden devices`)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// External speech-to-text command (WAV on stdin, transcript on stdout)
    #[arg(long, value_name = "COMMAND")]
    pub stt_command: Option<String>,

    /// Maximum call duration in seconds before the safety stop
    #[arg(long, value_name = "SECONDS")]
    pub max_call_secs: Option<u64>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Monitor the active call until it ends or Ctrl+C (default command)
    Monitor,

    /// List available audio input devices
    Devices,

    /// Show persisted monitoring status
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_args_defaults_to_monitor() {
        let cli = Cli::parse_from(["callwarden"]);
        assert!(cli.command.is_none());
        assert!(!cli.quiet);
    }

    #[test]
    fn test_devices_subcommand() {
        let cli = Cli::parse_from(["callwarden", "devices"]);
        assert!(matches!(cli.command, Some(Commands::Devices)));
    }

    #[test]
    fn test_monitor_flags() {
        let cli = Cli::parse_from([
            "callwarden",
            "--device",
            "pipewire",
            "--stt-command",
            "whisper-cli",
            "--max-call-secs",
            "120",
            "monitor",
        ]);
        assert_eq!(cli.device.as_deref(), Some("pipewire"));
        assert_eq!(cli.stt_command.as_deref(), Some("whisper-cli"));
        assert_eq!(cli.max_call_secs, Some(120));
        assert!(matches!(cli.command, Some(Commands::Monitor)));
    }
}
