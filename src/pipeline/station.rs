//! Station abstraction: each pipeline stage runs in its own thread,
//! connected to its neighbors by bounded channels.

use crate::pipeline::error::{ErrorReporter, StationError};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// One stage of the monitoring pipeline.
///
/// A station consumes inputs from its channel until the channel closes or a
/// fatal error occurs, producing zero or one output per input.
pub trait Station: Send + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Processes a single input item.
    ///
    /// `Ok(None)` means the item was consumed without producing output
    /// (filtered, or handled out of band).
    fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError>;

    /// Station name for error reporting.
    fn name(&self) -> &'static str;

    /// Called once when the station loop exits.
    fn shutdown(&mut self) {}
}

/// Owns the thread a station runs on.
pub struct StationRunner {
    handle: Option<JoinHandle<()>>,
    station_name: &'static str,
}

impl StationRunner {
    /// Spawns `station` on a dedicated thread, wired between `input_rx` and
    /// `output_tx`. The thread exits when the input channel disconnects, the
    /// output channel disconnects, or the station returns a fatal error.
    pub fn spawn<S: Station>(
        mut station: S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let station_name = station.name();

        let handle = thread::spawn(move || {
            for input in input_rx.iter() {
                match station.process(input) {
                    Ok(Some(output)) => {
                        if output_tx.send(output).is_err() {
                            // Downstream gone, nothing left to feed
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        error_reporter.report(station.name(), &err);
                        if err.is_fatal() {
                            break;
                        }
                    }
                }
            }
            station.shutdown();
        });

        Self {
            handle: Some(handle),
            station_name,
        }
    }

    /// Waits for the station thread to finish, surfacing panics as an error
    /// message suitable for logging.
    pub fn join(mut self) -> Result<(), String> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| format!("Station '{}' thread panicked", self.station_name)),
            None => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.station_name
    }
}
