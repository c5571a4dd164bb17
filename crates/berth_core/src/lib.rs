//! berth core: the embedded store for a multi-service client app.
//!
//! A [`Store`] owns a fixed set of named boxes, each holding records of
//! one type behind a typed [`BoxHandle`]. Profiles, settings, indexers,
//! external modules, logs, and alerts each get a box; the profile and
//! settings surfaces add the invariants those boxes share (one active
//! profile, validated setting values). Backups project every box into a
//! JSON document, optionally encrypted under a passphrase.
//!
//! # Example
//!
//! ```
//! use berth_core::{keys, Profile, Store};
//!
//! # fn main() -> berth_core::StoreResult<()> {
//! let store = Store::open_in_memory()?;
//!
//! let profiles = store.profiles()?;
//! profiles.create(Profile::new("prod"))?;
//! profiles.set_active("prod")?;
//!
//! let settings = store.settings()?;
//! settings.update(&keys::THEME, "black".to_string())?;
//!
//! let backup = store.export()?;
//! assert!(!backup.encrypted);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backup;
mod boxes;
mod crypto;
mod error;
mod models;
mod profiles;
mod record;
mod settings;
mod store;
mod types;

pub use backup::{BackupBoxes, BackupDocument, BackupRecord, BACKUP_FORMAT_VERSION};
pub use boxes::BoxHandle;
pub use crypto::{CryptoManager, EncryptionKey, KEY_SIZE, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
pub use error::{StoreError, StoreResult};
pub use models::{
    AlertEntry, ExternalModule, Indexer, LogEntry, LogLevel, Profile, ServiceConfig, SettingRecord,
};
pub use profiles::ProfileManager;
pub use record::BoxRecord;
pub use settings::{keys, SettingKey, SettingValue, Settings};
pub use store::{box_names, Store, StoreStats, RESERVED_TYPE_IDS};
pub use types::{unix_millis_now, BoxKey};
