//! Recording session started by `TASKSMITH_RECORD=<dir>`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::recorder::CassetteRecorder;
use crate::error::{Error, Result};

/// Owns the shared recorder that every recording adapter writes into.
pub struct RecordingSession {
    /// Recorder shared by the primary and research adapters.
    pub recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Starts a session writing `<dir>/<timestamp>.cassette.yaml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file already exists.
    pub fn start(dir: &Path, model: &str) -> Result<Self> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = dir.join(format!("{timestamp}.cassette.yaml"));
        if path.exists() {
            return Err(Error::Io(format!("Cassette already exists: {}", path.display())));
        }
        let recorder = CassetteRecorder::new(path, timestamp, model);
        Ok(Self { recorder: Arc::new(Mutex::new(recorder)) })
    }

    /// Writes the cassette. All adapters holding the recorder must be dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter still holds the recorder or the write fails.
    pub fn finish(self) -> Result<PathBuf> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| Error::Io("Recording adapters still hold the recorder".into()))?
            .into_inner()
            .map_err(|e| Error::Io(format!("Recorder lock poisoned: {e}")))?;
        recorder.finish()
    }
}
