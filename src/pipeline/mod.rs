//! Continuous call-monitoring pipeline.
//!
//! Audio capture feeds fixed-cadence chunks to a transcription station,
//! whose text flows into a trigger station that buffers transcript and
//! dispatches debounced spam classification. The controller owns the
//! lifecycle state machine and thread teardown.

pub mod controller;
pub mod error;
pub mod station;
pub mod transcriber_station;
pub mod transcript_buffer;
pub mod trigger_station;
pub mod types;

pub use controller::{CallMonitor, MonitorConfig, MonitorState};
pub use error::{ErrorReporter, LogReporter, StationError};
pub use station::{Station, StationRunner};
pub use transcriber_station::TranscriberStation;
pub use transcript_buffer::TranscriptBuffer;
pub use trigger_station::TriggerStation;
pub use types::{AlertEvent, AudioChunk, TranscriptSegment};
