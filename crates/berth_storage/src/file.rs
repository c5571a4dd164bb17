//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extension used for box files.
const BOX_EXTENSION: &str = "box";

/// A file-based storage backend.
///
/// Each named box is stored as `<dir>/<name>.box`. Data survives process
/// restarts.
///
/// # Durability
///
/// `write_box` writes to a temporary file, calls `sync_all`, then renames
/// it over the box file. A crash mid-write therefore leaves either the
/// old blob or the new one on disk, never a torn mixture.
///
/// # Thread Safety
///
/// A single write lock serializes replacements; reads of distinct boxes
/// go straight to the filesystem.
///
/// # Example
///
/// ```no_run
/// use berth_storage::{FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("store_dir")).unwrap();
/// backend.write_box("settings", b"blob").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Opens a file backend rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the backing directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn box_path(&self, name: &str) -> StorageResult<PathBuf> {
        // Box names are fixed identifiers; anything path-like is a caller bug.
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(StorageError::InvalidBoxName {
                name: name.to_string(),
            });
        }
        Ok(self.dir.join(format!("{name}.{BOX_EXTENSION}")))
    }
}

impl StorageBackend for FileBackend {
    fn read_box(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.box_path(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn write_box(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
        let path = self.box_path(name)?;
        let tmp_path = self.dir.join(format!("{name}.{BOX_EXTENSION}.tmp"));

        let _guard = self.write_lock.lock();

        let mut tmp = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        tmp.write_all(bytes)?;
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &path)?;

        // Make the rename itself durable.
        if let Ok(dir) = File::open(&self.dir) {
            let _ = dir.sync_all();
        }

        Ok(())
    }

    fn list_boxes(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(BOX_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert!(backend.list_boxes().unwrap().is_empty());
    }

    #[test]
    fn file_write_then_read() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.write_box("profiles", b"hello").unwrap();
        assert_eq!(
            backend.read_box("profiles").unwrap(),
            Some(b"hello".to_vec())
        );
    }

    #[test]
    fn file_missing_box_reads_none() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.read_box("missing").unwrap(), None);
    }

    #[test]
    fn file_write_replaces() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.write_box("settings", b"old contents").unwrap();
        backend.write_box("settings", b"new").unwrap();
        assert_eq!(
            backend.read_box("settings").unwrap(),
            Some(b"new".to_vec())
        );
    }

    #[test]
    fn file_persistence_across_reopen() {
        let dir = tempdir().unwrap();

        {
            let backend = FileBackend::open(dir.path()).unwrap();
            backend.write_box("logs", b"persistent data").unwrap();
        }

        {
            let backend = FileBackend::open(dir.path()).unwrap();
            assert_eq!(
                backend.read_box("logs").unwrap(),
                Some(b"persistent data".to_vec())
            );
        }
    }

    #[test]
    fn file_list_boxes() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.write_box("logs", b"").unwrap();
        backend.write_box("alerts", b"").unwrap();

        assert_eq!(backend.list_boxes().unwrap(), vec!["alerts", "logs"]);
    }

    #[test]
    fn file_rejects_path_like_names() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        assert!(matches!(
            backend.write_box("../escape", b""),
            Err(StorageError::InvalidBoxName { .. })
        ));
        assert!(matches!(
            backend.write_box("", b""),
            Err(StorageError::InvalidBoxName { .. })
        ));
    }

    #[test]
    fn file_tmp_file_not_listed() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.write_box("settings", b"x").unwrap();

        // Only the final .box file should be visible.
        assert_eq!(backend.list_boxes().unwrap(), vec!["settings"]);
    }
}
