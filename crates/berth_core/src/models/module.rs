//! User-added external service shortcuts.

use crate::record::BoxRecord;
use berth_codec::{CodecResult, FieldRecord, FieldSpec, Schema, TypeId, Value, ValueKind};

/// A user-added link to a service outside the built-in set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalModule {
    /// Display name.
    pub name: String,
    /// URL the module opens.
    pub host: String,
}

const TAG_NAME: u16 = 0;
const TAG_HOST: u16 = 1;

impl ExternalModule {
    /// Creates a module pointing at the given host.
    #[must_use]
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
        }
    }
}

impl BoxRecord for ExternalModule {
    const TYPE_ID: TypeId = TypeId::new(4);

    fn schema() -> CodecResult<Schema> {
        Schema::new(
            Self::TYPE_ID,
            "external_module",
            vec![
                FieldSpec::new(TAG_NAME, "name", ValueKind::Text, Value::Text(String::new())),
                FieldSpec::new(TAG_HOST, "host", ValueKind::Text, Value::Text(String::new())),
            ],
        )
    }

    fn to_fields(&self) -> FieldRecord {
        let mut record = FieldRecord::default();
        record.set(TAG_NAME, Value::Text(self.name.clone()));
        record.set(TAG_HOST, Value::Text(self.host.clone()));
        record
    }

    fn from_fields(record: &FieldRecord) -> Self {
        Self {
            name: record.text_at(TAG_NAME).unwrap_or_default().to_string(),
            host: record.text_at(TAG_HOST).unwrap_or_default().to_string(),
        }
    }
}
