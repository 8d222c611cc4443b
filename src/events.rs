//! JSON event protocol for monitoring consumers.
//!
//! Events are serialized as single-line JSON objects tagged with a `type`
//! field, suitable for line-delimited streaming to a UI or log collector.

use crate::error::Result;
use crate::pipeline::types::AlertEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a monitoring run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Explicit stop request (call ended or user action).
    Requested,
    /// The safety limit on call duration expired.
    Timeout,
    /// Audio capture failed beyond the retry budget.
    AudioFailure,
    /// A pipeline stage died and the run tore itself down.
    PipelineFailure,
}

/// Events emitted by a `CallMonitor` over its event channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A monitoring run started.
    Started { at: DateTime<Utc> },
    /// Rolling preview of the transcript tail while the run listens.
    Listening { preview: String },
    /// A scam was detected with enough confidence to surface.
    Alert(AlertEvent),
    /// The monitoring run ended.
    Stopped { reason: StopReason },
}

impl MonitorEvent {
    /// Serializes to a single-line JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses an event from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
