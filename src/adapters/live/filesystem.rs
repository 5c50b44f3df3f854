//! Disk-backed filesystem adapter.

use std::path::Path;

use crate::error::{Error, Result};
use crate::ports::filesystem::FileSystem;

/// Filesystem adapter performing real disk I/O through `std::fs`.
pub struct DiskFileSystem;

impl FileSystem for DiskFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("Failed to read {}: {e}", path.display())))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Io(format!("Failed to create directory {}: {e}", parent.display()))
            })?;
        }
        std::fs::write(path, contents)
            .map_err(|e| Error::Io(format!("Failed to write {}: {e}", path.display())))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_parent_directories() {
        let dir = std::env::temp_dir().join("tasksmith_disk_fs_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested/tasks.json");

        DiskFileSystem.write(&path, "{}").unwrap();
        assert!(DiskFileSystem.exists(&path));
        assert_eq!(DiskFileSystem.read_to_string(&path).unwrap(), "{}");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DiskFileSystem.read_to_string(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, Error::Io(msg) if msg.contains("/definitely/not/here.json")));
    }
}
