//! Backup documents: a lossless JSON projection of every box.
//!
//! Records are projected by field *name* rather than tag, so a backup
//! stays readable and survives tag-level format evolution the same way
//! stored records do (unknown names skipped, absent names backfilled).
//! Each record carries its box key in a reserved `"_key"` member.
//!
//! Encrypted backups keep `format_version`, `created_at`, `encrypted`,
//! and `salt` in plaintext; the box map is serialized to JSON and
//! AES-256-GCM-encrypted under a passphrase-derived key.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use berth_codec::{FieldRecord, Schema, Value};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{info, warn};

use crate::boxes::StoreBox;
use crate::crypto::{generate_salt, CryptoManager, EncryptionKey};
use crate::error::{StoreError, StoreResult};
use crate::store::Store;
use crate::types::{unix_millis_now, BoxKey};

/// Newest backup document version this build reads and writes.
pub const BACKUP_FORMAT_VERSION: u32 = 1;

/// Reserved record member carrying the box key.
const KEY_MEMBER: &str = "_key";

/// One record as it appears in a backup: field name to JSON value,
/// plus the reserved `"_key"` member.
pub type BackupRecord = JsonMap<String, JsonValue>;

/// Box name to records, the payload of a backup.
pub type BackupBoxes = BTreeMap<String, Vec<BackupRecord>>;

/// A backup of the whole store.
///
/// Plaintext documents carry `boxes`; encrypted documents carry `salt`
/// and `payload` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDocument {
    /// Document format version.
    pub format_version: u32,
    /// Unix milliseconds when the backup was taken.
    pub created_at: u64,
    /// Whether the box data is encrypted.
    pub encrypted: bool,
    /// Base64 salt for passphrase key derivation (encrypted documents).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    /// Box contents (plaintext documents).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boxes: Option<BackupBoxes>,
    /// Base64 `nonce || ciphertext` of the serialized box contents
    /// (encrypted documents).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl BackupDocument {
    /// Serializes the document to a JSON string.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::InvalidBackup`] on a serialization
    /// failure.
    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::invalid_backup(format!("serialization failed: {e}")))
    }

    /// Parses a document from a JSON string.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::InvalidBackup`] when the text is not a
    /// backup document.
    pub fn from_json(text: &str) -> StoreResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| StoreError::invalid_backup(format!("parse failed: {e}")))
    }
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Integer(i) => JsonValue::from(*i),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Map(pairs) => JsonValue::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                .collect(),
        ),
    }
}

/// Converts a JSON member back to a field value under the declared
/// kind. `None` means the member does not fit and the field falls back
/// to its default, mirroring the record decoder's robustness rule.
fn json_to_value(kind: berth_codec::ValueKind, json: &JsonValue) -> Option<Value> {
    use berth_codec::ValueKind;
    match (kind, json) {
        (_, JsonValue::Null) => Some(Value::Null),
        (ValueKind::Bool, JsonValue::Bool(b)) => Some(Value::Bool(*b)),
        (ValueKind::Integer, JsonValue::Number(n)) => n.as_i64().map(Value::Integer),
        (ValueKind::Text, JsonValue::String(s)) => Some(Value::Text(s.clone())),
        (ValueKind::Map, JsonValue::Object(members)) => {
            let mut pairs = Vec::with_capacity(members.len());
            for (k, v) in members {
                pairs.push((k.clone(), v.as_str()?.to_string()));
            }
            Some(Value::map(pairs))
        }
        _ => None,
    }
}

fn key_to_json(key: &BoxKey) -> JsonValue {
    match key {
        BoxKey::Serial(n) => JsonValue::from(*n),
        BoxKey::Text(s) => JsonValue::String(s.clone()),
    }
}

fn json_to_key(box_name: &str, json: &JsonValue) -> StoreResult<BoxKey> {
    match json {
        JsonValue::Number(n) => match n.as_u64() {
            // u64::MAX would leave the restored box no next serial.
            Some(serial) if serial < u64::MAX => Ok(BoxKey::Serial(serial)),
            _ => Err(StoreError::invalid_backup(format!(
                "box {box_name}: serial key out of range"
            ))),
        },
        JsonValue::String(s) => Ok(BoxKey::text(s.clone())),
        _ => Err(StoreError::invalid_backup(format!(
            "box {box_name}: key must be a number or a string"
        ))),
    }
}

fn record_to_json(schema: &Schema, key: &BoxKey, record: &FieldRecord) -> BackupRecord {
    let mut json = BackupRecord::new();
    json.insert(KEY_MEMBER.to_string(), key_to_json(key));
    for spec in schema.fields() {
        let value = record.get(spec.tag).unwrap_or(&spec.default);
        json.insert(spec.name.to_string(), value_to_json(value));
    }
    json
}

fn json_to_record(
    box_name: &str,
    schema: &Schema,
    json: &BackupRecord,
) -> StoreResult<(BoxKey, FieldRecord)> {
    let key = json
        .get(KEY_MEMBER)
        .ok_or_else(|| {
            StoreError::invalid_backup(format!("box {box_name}: record missing {KEY_MEMBER:?}"))
        })
        .and_then(|raw| json_to_key(box_name, raw))?;

    let mut record = FieldRecord::default();
    for (member, raw) in json {
        if member.as_str() == KEY_MEMBER {
            continue;
        }
        // Unknown member names are skipped, like unknown wire tags.
        if let Some(spec) = schema.field_by_name(member) {
            if let Some(value) = json_to_value(spec.kind, raw) {
                record.set(spec.tag, value);
            }
        }
    }
    for spec in schema.fields() {
        if record.get(spec.tag).is_none() {
            record.set(spec.tag, spec.default.clone());
        }
    }
    Ok((key, record))
}

/// Snapshots every box into a box map, holding all box locks in name
/// order for the duration.
fn snapshot_boxes(store: &Store) -> BackupBoxes {
    let boxes: Vec<_> = store.boxes_by_name().collect();
    let guards: Vec<_> = boxes
        .iter()
        .map(|(_, store_box)| store_box.read_state())
        .collect();

    let mut out = BackupBoxes::new();
    for ((name, store_box), state) in boxes.iter().zip(&guards) {
        let records = state
            .records
            .iter()
            .map(|(key, record)| record_to_json(store_box.schema(), key, record))
            .collect();
        out.insert((*name).to_string(), records);
    }
    out
}

pub(crate) fn export(store: &Store) -> StoreResult<BackupDocument> {
    let boxes = snapshot_boxes(store);
    info!(boxes = boxes.len(), "store exported");
    Ok(BackupDocument {
        format_version: BACKUP_FORMAT_VERSION,
        created_at: u64::try_from(unix_millis_now()).unwrap_or(0),
        encrypted: false,
        salt: None,
        boxes: Some(boxes),
        payload: None,
    })
}

pub(crate) fn export_encrypted(store: &Store, passphrase: &str) -> StoreResult<BackupDocument> {
    let boxes = snapshot_boxes(store);
    let plaintext = serde_json::to_vec(&boxes)
        .map_err(|e| StoreError::encryption_failed(format!("serialization failed: {e}")))?;

    let salt = generate_salt();
    let key = EncryptionKey::derive_from_passphrase(passphrase, &salt)?;
    let payload = CryptoManager::new(&key).encrypt(&plaintext)?;

    info!(boxes = boxes.len(), "store exported encrypted");
    Ok(BackupDocument {
        format_version: BACKUP_FORMAT_VERSION,
        created_at: u64::try_from(unix_millis_now()).unwrap_or(0),
        encrypted: true,
        salt: Some(BASE64.encode(salt)),
        boxes: None,
        payload: Some(BASE64.encode(payload)),
    })
}

fn decrypt_boxes(document: &BackupDocument, passphrase: Option<&str>) -> StoreResult<BackupBoxes> {
    let passphrase = passphrase.ok_or_else(|| {
        warn!("restore of encrypted backup attempted without passphrase");
        StoreError::decryption("document is encrypted, passphrase required")
    })?;
    let salt = document
        .salt
        .as_deref()
        .ok_or_else(|| StoreError::invalid_backup("encrypted document missing salt"))?;
    let payload = document
        .payload
        .as_deref()
        .ok_or_else(|| StoreError::invalid_backup("encrypted document missing payload"))?;

    let salt = BASE64
        .decode(salt)
        .map_err(|_| StoreError::invalid_backup("salt is not valid base64"))?;
    let payload = BASE64
        .decode(payload)
        .map_err(|_| StoreError::invalid_backup("payload is not valid base64"))?;

    let key = EncryptionKey::derive_from_passphrase(passphrase, &salt)?;
    let plaintext = CryptoManager::new(&key).decrypt(&payload).map_err(|e| {
        warn!("backup decryption failed");
        e
    })?;

    serde_json::from_slice(&plaintext)
        .map_err(|e| StoreError::invalid_backup(format!("decrypted payload is not valid: {e}")))
}

pub(crate) fn restore(
    store: &Store,
    document: &BackupDocument,
    passphrase: Option<&str>,
) -> StoreResult<()> {
    if document.format_version > BACKUP_FORMAT_VERSION {
        return Err(StoreError::FormatVersion {
            found: document.format_version,
            supported: BACKUP_FORMAT_VERSION,
        });
    }

    let boxes = if document.encrypted {
        decrypt_boxes(document, passphrase)?
    } else {
        document
            .boxes
            .clone()
            .ok_or_else(|| StoreError::invalid_backup("plaintext document missing boxes"))?
    };

    // Stage every box's decoded contents before touching any state, so
    // a malformed document leaves the store unchanged.
    let mut staged: Vec<(Arc<StoreBox>, BTreeMap<BoxKey, FieldRecord>)> = Vec::new();
    for (box_name, records) in &boxes {
        let Some(store_box) = store.box_by_name(box_name) else {
            warn!(box_name = %box_name, "backup names an unknown box, skipped");
            continue;
        };
        let mut contents = BTreeMap::new();
        for json in records {
            let (key, record) = json_to_record(box_name, store_box.schema(), json)?;
            contents.insert(key, record);
        }
        staged.push((Arc::clone(store_box), contents));
    }

    // Apply under every staged box's write lock, acquired in name order.
    let handles: Vec<Arc<StoreBox>> = staged.iter().map(|(b, _)| Arc::clone(b)).collect();
    let mut guards: Vec<_> = handles.iter().map(|b| b.lock_state()).collect();
    for ((store_box, guard), (_, contents)) in
        handles.iter().zip(guards.iter_mut()).zip(staged)
    {
        store_box.replace_all_locked(&mut **guard, contents)?;
    }

    info!(boxes = handles.len(), "store restored from backup");
    Ok(())
}
