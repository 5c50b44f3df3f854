//! Accumulates interactions during a live run and writes them as a cassette.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use super::format::{Cassette, Interaction};
use crate::error::{Error, Result};

/// Collects interactions in memory until [`CassetteRecorder::finish`].
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    model: String,
    interactions: Vec<Interaction>,
}

impl CassetteRecorder {
    /// Creates a recorder that will write to `path`.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, model: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into(), model: model.into(), interactions: Vec::new() }
    }

    /// Appends an interaction; its `seq` is the number of interactions recorded so far.
    pub fn record(
        &mut self,
        port: &str,
        method: &str,
        input: serde_json::Value,
        output: serde_json::Value,
    ) {
        let seq = self.interactions.len() as u64;
        self.interactions.push(Interaction {
            seq,
            port: port.to_string(),
            method: method.to_string(),
            input,
            output,
        });
    }

    /// Records a call outcome using the `{"ok": ..}` / `{"err": ..}` convention.
    pub fn record_result<I, T>(&mut self, port: &str, method: &str, input: &I, result: &Result<T>)
    where
        I: Serialize,
        T: Serialize,
    {
        let input = serde_json::to_value(input).unwrap_or(serde_json::Value::Null);
        let output = match result {
            Ok(value) => serde_json::json!({
                "ok": serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
            }),
            Err(e) => serde_json::json!({ "err": e.to_string() }),
        };
        self.record(port, method, input, output);
    }

    /// Number of interactions recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Writes the cassette YAML and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if serialization or the write fails.
    pub fn finish(self) -> Result<PathBuf> {
        let cassette = Cassette {
            name: self.name,
            recorded_at: Utc::now(),
            model: self.model,
            interactions: self.interactions,
        };
        let yaml = serde_yaml::to_string(&cassette)
            .map_err(|e| Error::Io(format!("Failed to serialize cassette: {e}")))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path)
    }
}
