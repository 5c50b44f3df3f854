//! On-disk YAML layout of a cassette.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded call to a provider port.
///
/// `output` follows the `{"ok": ...}` / `{"err": "message"}` convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Position in the whole recording, assigned by the recorder.
    pub seq: u64,
    /// Port name: `llm` for the primary provider, `research` for the secondary.
    pub port: String,
    /// `complete` or `stream`.
    pub method: String,
    /// The request as sent.
    #[serde(default)]
    pub input: serde_json::Value,
    /// The provider's answer or failure.
    pub output: serde_json::Value,
}

/// A named, timestamped sequence of interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When the recording finished.
    pub recorded_at: DateTime<Utc>,
    /// Model configured while recording.
    #[serde(default)]
    pub model: String,
    /// Interactions in call order.
    pub interactions: Vec<Interaction>,
}
