//! Speech-to-text seam.
//!
//! The transcription engine itself is an external collaborator; the trait
//! boundary, a subprocess-backed implementation, and a test double live here.

pub mod command;
pub mod transcriber;

pub use command::CommandTranscriber;
pub use transcriber::{MockTranscriber, Transcriber};
