use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;

/// One event as the platform delivered it, before normalization.
///
/// Relay wire form: `{ "event": "like", "data": { "uniqueId": "...", ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "event")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl RawEvent {
    pub fn new(kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

/// Lifecycle of the single upstream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No session and no attempt in flight.
    Idle,

    /// A connect attempt is in flight.
    Connecting,

    /// Platform listeners attached; events are flowing.
    Connected,
}

/// Point-in-time view of the connector, for status replay and health output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectorStatus {
    pub state: ConnectionState,
    pub channel: Option<String>,
    pub generation: u64,
}

impl ConnectorStatus {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

/// What a pump task forwards from a live stream.
#[derive(Debug)]
pub enum PumpItem {
    Event(RawEvent),
    Error(UpstreamError),
    /// The stream finished without an error.
    Ended,
}
