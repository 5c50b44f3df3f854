//! Filesystem port for reading PRDs and persisting task files.

use std::path::Path;

use crate::error::Result;

/// Provides filesystem access for reading and writing files.
///
/// Abstracting the filesystem lets the task store run against memory in tests.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Writes the given contents to a file, creating parent directories and
    /// overwriting any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Returns `true` if the path exists.
    fn exists(&self, path: &Path) -> bool;
}
