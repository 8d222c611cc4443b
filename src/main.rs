use anyhow::{bail, Context, Result};
use callwarden::audio::capture::{list_devices, open_call_source};
use callwarden::classify::KeywordClassifier;
use callwarden::cli::{Cli, Commands};
use callwarden::config::Config;
use callwarden::events::MonitorEvent;
use callwarden::pipeline::controller::{CallMonitor, MonitorConfig};
use callwarden::status::StatusStore;
use callwarden::stt::{CommandTranscriber, Transcriber};
use clap::Parser;
use crossbeam_channel::bounded;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Monitor) => {
            let config = load_config(&cli)?;
            run_monitor(config, cli.quiet)?;
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
        Some(Commands::Status) => {
            let config = load_config(&cli)?;
            show_status(&config);
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/callwarden/config.toml)
/// 3. Built-in defaults
/// Environment variables and CLI flags override the file in that order.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(path) = cli.config.as_deref() {
        Config::load(path)?
    } else if let Some(default_path) = Config::default_path() {
        Config::load_or_default(&default_path)?
    } else {
        Config::default()
    };
    config = config.with_env_overrides();

    if let Some(device) = &cli.device {
        config.audio.device = Some(device.clone());
    }
    if let Some(command) = &cli.stt_command {
        config.stt.command = Some(command.clone());
    }
    if let Some(secs) = cli.max_call_secs {
        config.detection.max_call_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

/// Run the monitoring pipeline until the safety stop, a pipeline failure,
/// or Ctrl+C.
fn run_monitor(config: Config, quiet: bool) -> Result<()> {
    let Some(stt_command) = config.stt.command.clone() else {
        bail!(
            "no speech-to-text command configured \
             (set stt.command in the config file or pass --stt-command)"
        );
    };

    let source = open_call_source(config.audio.device.as_deref())?;
    let transcriber: Arc<dyn Transcriber> =
        Arc::new(CommandTranscriber::new(&stt_command, &config.stt.args));
    let classifier = Arc::new(KeywordClassifier::new());

    let (event_tx, event_rx) = bounded(64);
    let monitor_config = MonitorConfig {
        event_tx: Some(event_tx),
        ..MonitorConfig::from_config(&config)
    };

    let monitor = Arc::new(CallMonitor::new(
        source,
        transcriber,
        classifier,
        monitor_config,
    ));

    let ctrlc_monitor = monitor.clone();
    ctrlc::set_handler(move || {
        if let Err(e) = ctrlc_monitor.stop() {
            eprintln!("callwarden: failed to stop monitor: {e}");
        }
    })
    .context("Failed to install Ctrl+C handler")?;

    monitor.on_call_started()?;
    if !quiet {
        eprintln!("callwarden: monitoring (Ctrl+C to stop)");
    }

    // Stream events as line-delimited JSON until the run ends
    loop {
        match event_rx.recv_timeout(Duration::from_millis(200)) {
            Ok(event) => {
                let stopped = matches!(event, MonitorEvent::Stopped { .. });
                if !quiet {
                    match event.to_json() {
                        Ok(json) => println!("{}", json),
                        Err(e) => eprintln!("callwarden: failed to encode event: {e}"),
                    }
                }
                if stopped {
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                if !monitor.is_monitoring() {
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    monitor.on_call_ended()?;
    Ok(())
}

/// List available audio input devices.
fn list_audio_devices() -> Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        eprintln!("No audio input devices found");
        std::process::exit(1);
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}

/// Print the persisted monitoring status.
fn show_status(config: &Config) {
    let store = StatusStore::new(config.status.path.clone());
    let status = store.current();

    println!("Monitoring: {}", if status.monitoring { "yes" } else { "no" });
    println!("Updated:    {}", status.updated_at.to_rfc3339());
    match &status.last_alert {
        Some(alert) => {
            println!(
                "Last alert: {} (confidence {:.2})",
                alert.raised_at.to_rfc3339(),
                alert.classification.confidence
            );
            println!("  {}", alert.classification.reasoning);
        }
        None => println!("Last alert: none"),
    }
}
