//! Error types for berth core.

use berth_codec::TypeId;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in berth store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] berth_storage::StorageError),

    /// Record codec error.
    ///
    /// Carries unknown/duplicate/reserved type-id failures as well as
    /// malformed record bytes.
    #[error("codec error: {0}")]
    Codec(#[from] berth_codec::CodecError),

    /// A box file is corrupted or has an invalid format.
    #[error("box {box_name} corrupted: {message}")]
    Corrupted {
        /// Name of the affected box.
        box_name: String,
        /// Description of the corruption.
        message: String,
    },

    /// A box was opened with a different record type than it holds.
    #[error("box {box_name} holds {actual}, requested {expected}")]
    TypeMismatch {
        /// Name of the affected box.
        box_name: String,
        /// The type the caller requested.
        expected: TypeId,
        /// The type the box is registered with.
        actual: TypeId,
    },

    /// The store has been shut down.
    #[error("store is closed")]
    StoreClosed,

    /// No box with this name exists in the store.
    #[error("unknown box: {name}")]
    UnknownBox {
        /// The requested box name.
        name: String,
    },

    /// A profile with this name already exists.
    #[error("profile already exists: {name}")]
    DuplicateName {
        /// The contested profile name.
        name: String,
    },

    /// No profile with this name exists.
    #[error("profile not found: {name}")]
    NotFound {
        /// The requested profile name.
        name: String,
    },

    /// A setting update carried a value outside its declared constraints.
    #[error("invalid value for setting {key}: {message}")]
    InvalidSettingValue {
        /// The setting key.
        key: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A backup document's format version is newer than this build supports.
    #[error("backup format version {found} is newer than supported version {supported}")]
    FormatVersion {
        /// Version declared by the document.
        found: u32,
        /// Newest version this build can restore.
        supported: u32,
    },

    /// A backup document could not be decrypted.
    #[error("decryption failed: {message}")]
    Decryption {
        /// Description of the failure.
        message: String,
    },

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// A backup document is malformed.
    #[error("invalid backup document: {message}")]
    InvalidBackup {
        /// Description of the problem.
        message: String,
    },
}

impl StoreError {
    /// Creates a corruption error for a box.
    pub fn corrupted(box_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupted {
            box_name: box_name.into(),
            message: message.into(),
        }
    }

    /// Creates a duplicate-profile error.
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    /// Creates a profile-not-found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates an invalid-setting-value error.
    pub fn invalid_setting(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSettingValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a decryption error.
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption {
            message: message.into(),
        }
    }

    /// Creates an encryption error.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid-backup error.
    pub fn invalid_backup(message: impl Into<String>) -> Self {
        Self::InvalidBackup {
            message: message.into(),
        }
    }
}
