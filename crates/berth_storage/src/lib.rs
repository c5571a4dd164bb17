//! # berth storage
//!
//! Storage backend trait and implementations for berth.
//!
//! This crate provides the lowest-level storage abstraction for berth.
//! Storage backends are **opaque byte stores** keyed by box name - they
//! do not interpret the data they store.
//!
//! ## Design Principles
//!
//! - Backends map box names to byte blobs (read, replace, list)
//! - No knowledge of berth record formats, schemas, or keys
//! - Replacement is atomic and durable on return
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`MemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use berth_storage::{MemoryBackend, StorageBackend};
//!
//! let backend = MemoryBackend::new();
//! backend.write_box("settings", b"blob").unwrap();
//! let data = backend.read_box("settings").unwrap();
//! assert_eq!(data, Some(b"blob".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::MemoryBackend;
