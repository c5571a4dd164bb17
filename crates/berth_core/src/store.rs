//! The store: box ownership, open/close lifecycle, first-run seeding.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use berth_codec::{SchemaRegistry, TypeId};
use berth_storage::{FileBackend, MemoryBackend, StorageBackend};
use parking_lot::RwLock;
use tracing::info;

use crate::backup::{self, BackupDocument};
use crate::boxes::{BoxHandle, StoreBox};
use crate::error::{StoreError, StoreResult};
use crate::models::{AlertEntry, ExternalModule, Indexer, LogEntry, Profile, SettingRecord};
use crate::profiles::ProfileManager;
use crate::record::BoxRecord;
use crate::settings::{keys, Settings};

/// Names of the store's boxes.
pub mod box_names {
    /// Connection profiles, keyed by profile name.
    pub const PROFILES: &str = "profiles";
    /// Settings, keyed by setting name.
    pub const SETTINGS: &str = "settings";
    /// Saved indexers, serial-keyed.
    pub const INDEXERS: &str = "indexers";
    /// External module shortcuts, serial-keyed.
    pub const EXTERNAL_MODULES: &str = "external_modules";
    /// Application log entries, serial-keyed, append-only.
    pub const LOGS: &str = "logs";
    /// In-app alerts, serial-keyed.
    pub const ALERTS: &str = "alerts";
}

/// Retired type identifiers that must never be registered again.
///
/// 7 was automation rules, 8 was search history. Their stored data may
/// still exist in old backups; reusing the ids would misdecode it.
pub const RESERVED_TYPE_IDS: [TypeId; 2] = [TypeId::new(7), TypeId::new(8)];

/// Per-box record counts, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Record count per box, in box-name order.
    pub box_counts: BTreeMap<&'static str, usize>,
    /// Sum of all box counts.
    pub total_records: usize,
}

/// The open store: owns every box and the shared open flag.
///
/// Opening registers all record schemas (duplicate or retired type ids
/// fail here, before any data is touched) and loads every box from the
/// backend. After [`Store::close`], every operation on the store or on
/// any handle obtained from it fails with [`StoreError::StoreClosed`];
/// reopening requires a fresh `Store`.
pub struct Store {
    boxes: BTreeMap<&'static str, Arc<StoreBox>>,
    open: Arc<RwLock<bool>>,
}

impl Store {
    /// Opens a file-backed store rooted at `dir`.
    ///
    /// Seeds a `"default"` profile and the active-profile setting when
    /// the profiles box is empty.
    ///
    /// # Errors
    ///
    /// Fails on backend I/O errors, corrupted box files, or schema
    /// registration conflicts.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let backend = FileBackend::open(dir.as_ref())?;
        Self::open_with_backend(Arc::new(backend))
    }

    /// Opens a store over an in-memory backend. Nothing persists past
    /// the backend's lifetime; intended for tests and ephemeral use.
    ///
    /// # Errors
    ///
    /// Fails only on schema registration conflicts.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_with_backend(Arc::new(MemoryBackend::new()))
    }

    /// Opens a store over an arbitrary backend.
    ///
    /// # Errors
    ///
    /// Fails on backend I/O errors, corrupted box blobs, or schema
    /// registration conflicts.
    pub fn open_with_backend(backend: Arc<dyn StorageBackend>) -> StoreResult<Self> {
        let mut registry = SchemaRegistry::with_reserved(RESERVED_TYPE_IDS);
        let open = Arc::new(RwLock::new(true));
        let mut boxes = BTreeMap::new();

        load_box::<Profile>(box_names::PROFILES, &mut registry, &mut boxes, &backend, &open)?;
        load_box::<SettingRecord>(box_names::SETTINGS, &mut registry, &mut boxes, &backend, &open)?;
        load_box::<Indexer>(box_names::INDEXERS, &mut registry, &mut boxes, &backend, &open)?;
        load_box::<ExternalModule>(
            box_names::EXTERNAL_MODULES,
            &mut registry,
            &mut boxes,
            &backend,
            &open,
        )?;
        load_box::<LogEntry>(box_names::LOGS, &mut registry, &mut boxes, &backend, &open)?;
        load_box::<AlertEntry>(box_names::ALERTS, &mut registry, &mut boxes, &backend, &open)?;

        let store = Self { boxes, open };

        let profiles = store.box_handle::<Profile>(box_names::PROFILES)?;
        if profiles.is_empty()? {
            let name = "default";
            profiles.write(name, &Profile::new(name))?;
            store
                .box_handle::<SettingRecord>(box_names::SETTINGS)?
                .write(keys::ACTIVE_PROFILE.name(), &SettingRecord::of_text(name))?;
            info!(profile = name, "seeded first-run profile");
        }

        info!(boxes = store.boxes.len(), "store opened");
        Ok(store)
    }

    /// Opens a typed handle to a named box.
    ///
    /// Idempotent: every handle for a name shares the same underlying
    /// box and lock.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::UnknownBox`] for an unrecognized name,
    /// or [`StoreError::TypeMismatch`] when `T` is not the record type
    /// the box is registered with.
    pub fn box_handle<T: BoxRecord>(&self, name: &str) -> StoreResult<BoxHandle<T>> {
        let store_box = self
            .boxes
            .get(name)
            .ok_or_else(|| StoreError::UnknownBox {
                name: name.to_string(),
            })?;
        let actual = store_box.schema().type_id();
        if actual != T::TYPE_ID {
            return Err(StoreError::TypeMismatch {
                box_name: name.to_string(),
                expected: T::TYPE_ID,
                actual,
            });
        }
        Ok(BoxHandle::new(Arc::clone(store_box)))
    }

    /// The typed settings surface.
    ///
    /// # Errors
    ///
    /// Cannot fail in practice; the settings box always exists.
    pub fn settings(&self) -> StoreResult<Settings> {
        Ok(Settings::new(
            self.box_handle::<SettingRecord>(box_names::SETTINGS)?,
        ))
    }

    /// The profile manager.
    ///
    /// # Errors
    ///
    /// Cannot fail in practice; both backing boxes always exist.
    pub fn profiles(&self) -> StoreResult<ProfileManager> {
        Ok(ProfileManager::new(
            self.box_handle::<Profile>(box_names::PROFILES)?,
            self.box_handle::<SettingRecord>(box_names::SETTINGS)?,
        ))
    }

    /// Per-box record counts.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let mut box_counts = BTreeMap::new();
        let mut total_records = 0;
        for (name, store_box) in &self.boxes {
            let count = store_box.len()?;
            box_counts.insert(*name, count);
            total_records += count;
        }
        Ok(StoreStats {
            box_counts,
            total_records,
        })
    }

    /// Exports every box as a plaintext backup document.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn export(&self) -> StoreResult<BackupDocument> {
        self.ensure_open()?;
        backup::export(self)
    }

    /// Exports every box as an encrypted backup document.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed or encryption fails.
    pub fn export_encrypted(&self, passphrase: &str) -> StoreResult<BackupDocument> {
        self.ensure_open()?;
        backup::export_encrypted(self, passphrase)
    }

    /// Restores boxes from a backup document, replacing the contents of
    /// every box the document names. Boxes the document does not name
    /// are untouched. A failure before the apply step leaves the whole
    /// store untouched.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed, the document's format version is
    /// unsupported, decryption fails, or the document is malformed.
    pub fn restore(
        &self,
        document: &BackupDocument,
        passphrase: Option<&str>,
    ) -> StoreResult<()> {
        self.ensure_open()?;
        backup::restore(self, document, passphrase)
    }

    /// Closes the store. Idempotent; all subsequent operations fail
    /// with [`StoreError::StoreClosed`].
    pub fn close(&self) {
        let mut open = self.open.write();
        if *open {
            *open = false;
            info!("store closed");
        }
    }

    /// Whether the store is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.open.read()
    }

    pub(crate) fn ensure_open(&self) -> StoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StoreError::StoreClosed)
        }
    }

    /// Boxes in name order, for the backup codec.
    pub(crate) fn boxes_by_name(&self) -> impl Iterator<Item = (&'static str, &Arc<StoreBox>)> {
        self.boxes.iter().map(|(name, store_box)| (*name, store_box))
    }

    pub(crate) fn box_by_name(&self, name: &str) -> Option<&Arc<StoreBox>> {
        self.boxes.get(name)
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.close();
    }
}

fn load_box<T: BoxRecord>(
    name: &'static str,
    registry: &mut SchemaRegistry,
    boxes: &mut BTreeMap<&'static str, Arc<StoreBox>>,
    backend: &Arc<dyn StorageBackend>,
    open: &Arc<RwLock<bool>>,
) -> StoreResult<()> {
    let schema = T::schema()?;
    registry.register(schema.clone())?;
    let store_box = StoreBox::load(name, schema, Arc::clone(backend), Arc::clone(open))?;
    boxes.insert(name, Arc::new(store_box));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoxKey;

    #[test]
    fn fresh_store_seeds_default_profile() {
        let store = Store::open_in_memory().unwrap();

        let profiles = store.profiles().unwrap();
        assert_eq!(profiles.list_names().unwrap(), vec!["default"]);

        let current = profiles.current().unwrap().unwrap();
        assert_eq!(current.name, "default");
    }

    #[test]
    fn box_handle_type_mismatch() {
        let store = Store::open_in_memory().unwrap();

        let result = store.box_handle::<Profile>(box_names::LOGS);
        assert!(matches!(result, Err(StoreError::TypeMismatch { .. })));
    }

    #[test]
    fn unknown_box_name() {
        let store = Store::open_in_memory().unwrap();

        let result = store.box_handle::<Profile>("downloads");
        assert!(matches!(result, Err(StoreError::UnknownBox { .. })));
    }

    #[test]
    fn close_is_idempotent_and_blocks_everything() {
        let store = Store::open_in_memory().unwrap();
        let logs = store.box_handle::<LogEntry>(box_names::LOGS).unwrap();

        store.close();
        store.close();
        assert!(!store.is_open());

        assert!(matches!(logs.len(), Err(StoreError::StoreClosed)));
        assert!(matches!(store.stats(), Err(StoreError::StoreClosed)));
        assert!(matches!(store.export(), Err(StoreError::StoreClosed)));
    }

    #[test]
    fn stats_count_records_per_box() {
        let store = Store::open_in_memory().unwrap();
        let indexers = store.box_handle::<Indexer>(box_names::INDEXERS).unwrap();
        indexers.append(&Indexer::new("one")).unwrap();
        indexers.append(&Indexer::new("two")).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.box_counts[box_names::INDEXERS], 2);
        assert_eq!(stats.box_counts[box_names::PROFILES], 1);
        assert_eq!(stats.total_records, 4); // seeded profile + setting + 2
    }

    #[test]
    fn data_survives_reopen_on_shared_backend() {
        let backend = Arc::new(MemoryBackend::new());

        {
            let store = Store::open_with_backend(backend.clone()).unwrap();
            let modules = store
                .box_handle::<ExternalModule>(box_names::EXTERNAL_MODULES)
                .unwrap();
            modules
                .append(&ExternalModule::new("overseerr", "https://r.example"))
                .unwrap();
            store.close();
        }

        let store = Store::open_with_backend(backend).unwrap();
        let modules = store
            .box_handle::<ExternalModule>(box_names::EXTERNAL_MODULES)
            .unwrap();
        let all = modules.read_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, BoxKey::serial(1));
        assert_eq!(all[0].1.name, "overseerr");
    }

    #[test]
    fn existing_profiles_are_not_reseeded() {
        let backend = Arc::new(MemoryBackend::new());

        {
            let store = Store::open_with_backend(backend.clone()).unwrap();
            let profiles = store.profiles().unwrap();
            profiles.create(Profile::new("prod")).unwrap();
            profiles.set_active("prod").unwrap();
            profiles.delete("default").unwrap();
            store.close();
        }

        let store = Store::open_with_backend(backend).unwrap();
        let profiles = store.profiles().unwrap();
        assert_eq!(profiles.list_names().unwrap(), vec!["prod"]);
        assert_eq!(profiles.current().unwrap().unwrap().name, "prod");
    }

    #[test]
    fn file_backed_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = Store::open(dir.path()).unwrap();
            let alerts = store.box_handle::<AlertEntry>(box_names::ALERTS).unwrap();
            alerts.append(&AlertEntry::new("hello", "world")).unwrap();
        }

        let store = Store::open(dir.path()).unwrap();
        let alerts = store.box_handle::<AlertEntry>(box_names::ALERTS).unwrap();
        let all = alerts.read_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].1.title, "hello");
    }
}
