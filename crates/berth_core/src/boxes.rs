//! Boxes: named, typed record collections over a storage backend.
//!
//! Every box keeps its full contents in memory and rewrites its backend
//! blob on each mutation. Blob writes are atomic at the backend level,
//! so a crash mid-update leaves the previous box contents intact.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use berth_codec::Schema;
use berth_storage::StorageBackend;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::BoxRecord;
use crate::types::BoxKey;

/// Magic bytes at the start of every box blob.
const BOX_MAGIC: [u8; 4] = *b"BBOX";

/// Box blob format version.
const BOX_FORMAT_VERSION: u16 = 1;

const KEY_KIND_SERIAL: u8 = 0;
const KEY_KIND_TEXT: u8 = 1;

/// In-memory contents of one box.
#[derive(Debug, Default)]
pub(crate) struct BoxState {
    /// Records keyed by box key. `BoxKey`'s ordering puts serial keys in
    /// numeric order, so iteration over a serial-keyed box follows
    /// insertion order.
    pub(crate) records: BTreeMap<BoxKey, berth_codec::FieldRecord>,
    /// Next serial to hand out from `append_record`.
    pub(crate) next_serial: u64,
}

impl BoxState {
    fn recompute_next_serial(&mut self) {
        let max = self
            .records
            .keys()
            .filter_map(BoxKey::as_serial)
            .max()
            .unwrap_or(0);
        self.next_serial = self.next_serial.max(max.saturating_add(1));
    }
}

/// An untyped box: records addressed by key, encoded under one schema.
///
/// The typed surface is [`BoxHandle`]; this type owns the state, the
/// lock, and the blob format.
pub(crate) struct StoreBox {
    name: &'static str,
    schema: Schema,
    backend: Arc<dyn StorageBackend>,
    open: Arc<RwLock<bool>>,
    state: RwLock<BoxState>,
}

impl StoreBox {
    /// Loads a box from the backend, or starts it empty if the backend
    /// has no blob for it.
    pub(crate) fn load(
        name: &'static str,
        schema: Schema,
        backend: Arc<dyn StorageBackend>,
        open: Arc<RwLock<bool>>,
    ) -> StoreResult<Self> {
        let state = match backend.read_box(name)? {
            Some(blob) => parse_blob(name, &schema, &blob)?,
            None => BoxState {
                records: BTreeMap::new(),
                next_serial: 1,
            },
        };
        debug!(box_name = name, records = state.records.len(), "box loaded");
        Ok(Self {
            name,
            schema,
            backend,
            open,
            state: RwLock::new(state),
        })
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn ensure_open(&self) -> StoreResult<()> {
        if *self.open.read() {
            Ok(())
        } else {
            Err(StoreError::StoreClosed)
        }
    }

    /// Reads one record.
    pub(crate) fn read_record(&self, key: &BoxKey) -> StoreResult<Option<berth_codec::FieldRecord>> {
        self.ensure_open()?;
        Ok(self.state.read().records.get(key).cloned())
    }

    /// Reads every record in key order.
    pub(crate) fn read_all_records(
        &self,
    ) -> StoreResult<Vec<(BoxKey, berth_codec::FieldRecord)>> {
        self.ensure_open()?;
        Ok(self
            .state
            .read()
            .records
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Inserts or replaces a record, then persists the box.
    pub(crate) fn write_record(
        &self,
        key: BoxKey,
        record: berth_codec::FieldRecord,
    ) -> StoreResult<()> {
        self.ensure_open()?;
        let mut state = self.state.write();
        self.write_locked(&mut state, key, record)
    }

    /// Inserts a record under the next serial key, then persists the box.
    pub(crate) fn append_record(
        &self,
        record: berth_codec::FieldRecord,
    ) -> StoreResult<BoxKey> {
        self.ensure_open()?;
        let mut state = self.state.write();
        let key = BoxKey::serial(state.next_serial);
        self.write_locked(&mut state, key.clone(), record)?;
        Ok(key)
    }

    /// Removes a record, then persists the box. Returns whether the key
    /// was present; deleting an absent key is not an error.
    pub(crate) fn delete_record(&self, key: &BoxKey) -> StoreResult<bool> {
        self.ensure_open()?;
        let mut state = self.state.write();
        self.delete_locked(&mut state, key)
    }

    pub(crate) fn contains(&self, key: &BoxKey) -> StoreResult<bool> {
        self.ensure_open()?;
        Ok(self.state.read().records.contains_key(key))
    }

    pub(crate) fn len(&self) -> StoreResult<usize> {
        self.ensure_open()?;
        Ok(self.state.read().records.len())
    }

    /// Takes the box's write lock. Used by callers that need several
    /// mutations on one or more boxes to appear as a single step.
    pub(crate) fn lock_state(&self) -> RwLockWriteGuard<'_, BoxState> {
        self.state.write()
    }

    /// Takes the box's read lock, for consistent multi-box snapshots.
    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, BoxState> {
        self.state.read()
    }

    /// Inserts or replaces a record under an already-held lock.
    pub(crate) fn write_locked(
        &self,
        state: &mut BoxState,
        key: BoxKey,
        record: berth_codec::FieldRecord,
    ) -> StoreResult<()> {
        if let Some(serial) = key.as_serial() {
            // A record at u64::MAX would leave no next serial to hand out.
            let next = serial
                .checked_add(1)
                .ok_or_else(|| StoreError::corrupted(self.name, "serial key out of range"))?;
            state.next_serial = state.next_serial.max(next);
        }
        state.records.insert(key, record);
        self.persist(state)
    }

    /// Removes a record under an already-held lock.
    pub(crate) fn delete_locked(&self, state: &mut BoxState, key: &BoxKey) -> StoreResult<bool> {
        if state.records.remove(key).is_none() {
            return Ok(false);
        }
        self.persist(state)?;
        Ok(true)
    }

    /// Replaces the entire box contents under an already-held lock.
    pub(crate) fn replace_all_locked(
        &self,
        state: &mut BoxState,
        records: BTreeMap<BoxKey, berth_codec::FieldRecord>,
    ) -> StoreResult<()> {
        state.records = records;
        state.next_serial = 1;
        state.recompute_next_serial();
        self.persist(state)
    }

    fn persist(&self, state: &BoxState) -> StoreResult<()> {
        let blob = encode_blob(&self.schema, state);
        self.backend.write_box(self.name, &blob)?;
        debug!(
            box_name = self.name,
            records = state.records.len(),
            bytes = blob.len(),
            "box persisted"
        );
        Ok(())
    }
}

fn encode_blob(schema: &Schema, state: &BoxState) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&BOX_MAGIC);
    out.extend_from_slice(&BOX_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&schema.type_id().as_u16().to_le_bytes());
    out.extend_from_slice(&(state.records.len() as u32).to_le_bytes());
    for (key, record) in &state.records {
        match key {
            BoxKey::Serial(n) => {
                out.push(KEY_KIND_SERIAL);
                out.extend_from_slice(&n.to_le_bytes());
            }
            BoxKey::Text(s) => {
                out.push(KEY_KIND_TEXT);
                out.extend_from_slice(&(s.len() as u32).to_le_bytes());
                out.extend_from_slice(s.as_bytes());
            }
        }
        let bytes = schema.encode(record);
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&bytes);
    }
    out
}

fn parse_blob(name: &str, schema: &Schema, blob: &[u8]) -> StoreResult<BoxState> {
    let mut reader = BlobReader { name, blob, pos: 0 };

    let magic = reader.take(4)?;
    if magic != BOX_MAGIC {
        return Err(StoreError::corrupted(name, "bad magic bytes"));
    }
    let version = reader.read_u16()?;
    if version != BOX_FORMAT_VERSION {
        return Err(StoreError::corrupted(
            name,
            format!("unsupported box format version {version}"),
        ));
    }
    let type_id = berth_codec::TypeId::new(reader.read_u16()?);
    if type_id != schema.type_id() {
        return Err(StoreError::TypeMismatch {
            box_name: name.to_string(),
            expected: schema.type_id(),
            actual: type_id,
        });
    }

    let count = reader.read_u32()?;
    let mut state = BoxState::default();
    for _ in 0..count {
        let key = match reader.read_u8()? {
            KEY_KIND_SERIAL => {
                let raw = reader.take(8)?;
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(raw);
                let serial = u64::from_le_bytes(bytes);
                if serial == u64::MAX {
                    return Err(StoreError::corrupted(name, "serial key out of range"));
                }
                BoxKey::Serial(serial)
            }
            KEY_KIND_TEXT => {
                let len = reader.read_u32()? as usize;
                let raw = reader.take(len)?;
                let text = std::str::from_utf8(raw)
                    .map_err(|_| StoreError::corrupted(name, "key is not valid UTF-8"))?;
                BoxKey::Text(text.to_string())
            }
            other => {
                return Err(StoreError::corrupted(
                    name,
                    format!("unknown key kind {other:#04x}"),
                ));
            }
        };
        let len = reader.read_u32()? as usize;
        let bytes = reader.take(len)?;
        let record = schema
            .decode(bytes)
            .map_err(|e| StoreError::corrupted(name, e.to_string()))?;
        state.records.insert(key, record);
    }
    if reader.pos != blob.len() {
        return Err(StoreError::corrupted(name, "trailing bytes after records"));
    }

    state.next_serial = 1;
    state.recompute_next_serial();
    Ok(state)
}

struct BlobReader<'a> {
    name: &'a str,
    blob: &'a [u8],
    pos: usize,
}

impl<'a> BlobReader<'a> {
    fn take(&mut self, len: usize) -> StoreResult<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|&e| e <= self.blob.len());
        match end {
            Some(end) => {
                let slice = &self.blob[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(StoreError::corrupted(
                self.name,
                format!("truncated at offset {}", self.pos),
            )),
        }
    }

    fn read_u8(&mut self) -> StoreResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> StoreResult<u16> {
        let raw = self.take(2)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    fn read_u32(&mut self) -> StoreResult<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

/// Typed view over a box.
///
/// Cheap to clone; all handles to one box share its state and lock.
pub struct BoxHandle<T: BoxRecord> {
    inner: Arc<StoreBox>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: BoxRecord> Clone for BoxHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        }
    }
}

impl<T: BoxRecord> BoxHandle<T> {
    pub(crate) fn new(inner: Arc<StoreBox>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    pub(crate) fn raw(&self) -> &Arc<StoreBox> {
        &self.inner
    }

    /// The box name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// Reads one record.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn read(&self, key: &BoxKey) -> StoreResult<Option<T>> {
        Ok(self
            .inner
            .read_record(key)?
            .map(|record| T::from_fields(&record)))
    }

    /// Reads every record in key order.
    ///
    /// Serial-keyed boxes come back in insertion order.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn read_all(&self) -> StoreResult<Vec<(BoxKey, T)>> {
        Ok(self
            .inner
            .read_all_records()?
            .into_iter()
            .map(|(key, record)| (key, T::from_fields(&record)))
            .collect())
    }

    /// Inserts or replaces a record. Durable when this returns.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed or the backend write fails.
    pub fn write(&self, key: impl Into<BoxKey>, value: &T) -> StoreResult<()> {
        self.inner.write_record(key.into(), value.to_fields())
    }

    /// Inserts a record under the next serial key and returns that key.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed or the backend write fails.
    pub fn append(&self, value: &T) -> StoreResult<BoxKey> {
        self.inner.append_record(value.to_fields())
    }

    /// Removes a record. Returns whether the key was present; deleting
    /// an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed or the backend write fails.
    pub fn delete(&self, key: &BoxKey) -> StoreResult<bool> {
        self.inner.delete_record(key)
    }

    /// Whether a record exists under this key.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn contains(&self, key: &BoxKey) -> StoreResult<bool> {
        self.inner.contains(key)
    }

    /// Number of records in the box.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn len(&self) -> StoreResult<usize> {
        self.inner.len()
    }

    /// Whether the box has no records.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExternalModule;
    use berth_storage::MemoryBackend;

    fn open_flag() -> Arc<RwLock<bool>> {
        Arc::new(RwLock::new(true))
    }

    fn module_box(backend: &Arc<MemoryBackend>, open: Arc<RwLock<bool>>) -> StoreBox {
        let backend: Arc<dyn StorageBackend> = backend.clone();
        StoreBox::load("modules", ExternalModule::schema().unwrap(), backend, open).unwrap()
    }

    fn handle(store_box: StoreBox) -> BoxHandle<ExternalModule> {
        BoxHandle::new(Arc::new(store_box))
    }

    #[test]
    fn write_then_read() {
        let backend = Arc::new(MemoryBackend::new());
        let modules = handle(module_box(&backend, open_flag()));

        let module = ExternalModule::new("overseerr", "https://requests.example");
        modules.write("overseerr", &module).unwrap();

        assert_eq!(
            modules.read(&BoxKey::text("overseerr")).unwrap(),
            Some(module)
        );
        assert_eq!(modules.read(&BoxKey::text("missing")).unwrap(), None);
    }

    #[test]
    fn append_assigns_increasing_serials() {
        let backend = Arc::new(MemoryBackend::new());
        let modules = handle(module_box(&backend, open_flag()));

        let k1 = modules
            .append(&ExternalModule::new("a", "http://a"))
            .unwrap();
        let k2 = modules
            .append(&ExternalModule::new("b", "http://b"))
            .unwrap();

        assert_eq!(k1, BoxKey::serial(1));
        assert_eq!(k2, BoxKey::serial(2));
    }

    #[test]
    fn contents_survive_reload() {
        let backend = Arc::new(MemoryBackend::new());
        {
            let modules = handle(module_box(&backend, open_flag()));
            modules
                .append(&ExternalModule::new("a", "http://a"))
                .unwrap();
            modules
                .append(&ExternalModule::new("b", "http://b"))
                .unwrap();
        }

        let modules = handle(module_box(&backend, open_flag()));
        let all = modules.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].1.name, "a");
        assert_eq!(all[1].1.name, "b");

        // Serial allocation resumes past the highest stored key.
        let k3 = modules
            .append(&ExternalModule::new("c", "http://c"))
            .unwrap();
        assert_eq!(k3, BoxKey::serial(3));
    }

    #[test]
    fn max_serial_key_is_rejected() {
        let backend = Arc::new(MemoryBackend::new());
        let modules = handle(module_box(&backend, open_flag()));

        let result = modules.write(
            BoxKey::serial(u64::MAX),
            &ExternalModule::new("m", "h"),
        );
        assert!(matches!(result, Err(StoreError::Corrupted { .. })));
        assert!(modules.is_empty().unwrap());
    }

    #[test]
    fn delete_missing_key_is_not_an_error() {
        let backend = Arc::new(MemoryBackend::new());
        let modules = handle(module_box(&backend, open_flag()));

        assert!(!modules.delete(&BoxKey::text("ghost")).unwrap());

        modules.write("real", &ExternalModule::new("r", "h")).unwrap();
        assert!(modules.delete(&BoxKey::text("real")).unwrap());
        assert!(modules.is_empty().unwrap());
    }

    #[test]
    fn closed_flag_blocks_operations() {
        let backend = Arc::new(MemoryBackend::new());
        let open = open_flag();
        let modules = handle(module_box(&backend, Arc::clone(&open)));

        modules.write("m", &ExternalModule::new("m", "h")).unwrap();
        *open.write() = false;

        assert!(matches!(
            modules.read(&BoxKey::text("m")),
            Err(StoreError::StoreClosed)
        ));
        assert!(matches!(
            modules.write("m2", &ExternalModule::new("m2", "h")),
            Err(StoreError::StoreClosed)
        ));
    }

    #[test]
    fn garbage_blob_reports_corruption() {
        let backend = Arc::new(MemoryBackend::new());
        backend.write_box("modules", b"not a box blob").unwrap();

        let backend: Arc<dyn StorageBackend> = backend;
        let result = StoreBox::load(
            "modules",
            ExternalModule::schema().unwrap(),
            backend,
            open_flag(),
        );
        assert!(matches!(result, Err(StoreError::Corrupted { .. })));
    }

    #[test]
    fn truncated_blob_reports_corruption() {
        let backend = Arc::new(MemoryBackend::new());
        {
            let modules = handle(module_box(&backend, open_flag()));
            modules.write("m", &ExternalModule::new("m", "h")).unwrap();
        }
        let blob = backend.blob("modules").unwrap();
        backend.write_box("modules", &blob[..blob.len() - 3]).unwrap();

        let backend: Arc<dyn StorageBackend> = backend;
        let result = StoreBox::load(
            "modules",
            ExternalModule::schema().unwrap(),
            backend,
            open_flag(),
        );
        assert!(matches!(result, Err(StoreError::Corrupted { .. })));
    }

    #[test]
    fn blob_for_other_type_reports_mismatch() {
        let backend = Arc::new(MemoryBackend::new());
        {
            let modules = handle(module_box(&backend, open_flag()));
            modules.write("m", &ExternalModule::new("m", "h")).unwrap();
        }

        let backend: Arc<dyn StorageBackend> = backend;
        let result = StoreBox::load(
            "modules",
            crate::models::Indexer::schema().unwrap(),
            backend,
            open_flag(),
        );
        assert!(matches!(result, Err(StoreError::TypeMismatch { .. })));
    }
}
