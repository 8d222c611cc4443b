//! Audio capture: the source trait, the primary/fallback combinator, and the
//! real cpal-backed device implementation.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod source;

pub use source::{AudioSource, FallbackAudioSource, MockAudioSource};
