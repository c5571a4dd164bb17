//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level storage backend for berth.
///
/// Storage backends are **opaque byte stores**. Each named box maps to
/// one byte blob; the backend does not interpret record formats, keys,
/// or schemas. Format interpretation lives entirely in berth_core.
///
/// # Invariants
///
/// - `write_box` replaces the box blob atomically: after a crash, a
///   reader sees either the old blob or the new one, never a mixture
/// - `write_box` is durable when it returns (data survives process
///   termination)
/// - `read_box` of a never-written box returns `Ok(None)`
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::MemoryBackend`] - For testing and ephemeral stores
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads the blob stored for a named box.
    ///
    /// Returns `None` if the box has never been written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn read_box(&self, name: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the blob stored for a named box.
    ///
    /// When this returns successfully the new blob is durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unusable or an I/O error occurs.
    fn write_box(&self, name: &str, bytes: &[u8]) -> StorageResult<()>;

    /// Lists the names of all boxes with stored blobs.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn list_boxes(&self) -> StorageResult<Vec<String>>;
}
