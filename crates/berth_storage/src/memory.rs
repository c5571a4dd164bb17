//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory storage backend.
///
/// This backend stores all box blobs in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use berth_storage::{MemoryBackend, StorageBackend};
///
/// let backend = MemoryBackend::new();
/// backend.write_box("settings", b"blob").unwrap();
/// assert_eq!(backend.read_box("settings").unwrap(), Some(b"blob".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    boxes: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the blob stored for a box, for inspection.
    #[must_use]
    pub fn blob(&self, name: &str) -> Option<Vec<u8>> {
        self.boxes.read().get(name).cloned()
    }

    /// Clears all stored blobs.
    pub fn clear(&self) {
        self.boxes.write().clear();
    }
}

impl StorageBackend for MemoryBackend {
    fn read_box(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.boxes.read().get(name).cloned())
    }

    fn write_box(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
        self.boxes.write().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn list_boxes(&self) -> StorageResult<Vec<String>> {
        let mut names: Vec<String> = self.boxes.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
