//! Storage shape for a single setting.

use crate::record::BoxRecord;
use berth_codec::{CodecResult, FieldRecord, FieldSpec, Schema, TypeId, Value, ValueKind};

/// One stored setting value.
///
/// The settings box holds one of these per setting key. All slots are
/// nullable; exactly the slot matching the setting's declared type is
/// set. The typed view over this record is [`crate::Settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingRecord {
    /// Boolean slot.
    pub bool_value: Option<bool>,
    /// Integer slot.
    pub integer_value: Option<i64>,
    /// Text slot.
    pub text_value: Option<String>,
}

const TAG_BOOL: u16 = 0;
const TAG_INTEGER: u16 = 1;
const TAG_TEXT: u16 = 2;

impl SettingRecord {
    /// A record holding a boolean.
    #[must_use]
    pub fn of_bool(value: bool) -> Self {
        Self {
            bool_value: Some(value),
            ..Self::default()
        }
    }

    /// A record holding an integer.
    #[must_use]
    pub fn of_integer(value: i64) -> Self {
        Self {
            integer_value: Some(value),
            ..Self::default()
        }
    }

    /// A record holding text.
    #[must_use]
    pub fn of_text(value: impl Into<String>) -> Self {
        Self {
            text_value: Some(value.into()),
            ..Self::default()
        }
    }
}

impl BoxRecord for SettingRecord {
    const TYPE_ID: TypeId = TypeId::new(2);

    fn schema() -> CodecResult<Schema> {
        Schema::new(
            Self::TYPE_ID,
            "setting",
            vec![
                FieldSpec::new(TAG_BOOL, "bool_value", ValueKind::Bool, Value::Null),
                FieldSpec::new(TAG_INTEGER, "integer_value", ValueKind::Integer, Value::Null),
                FieldSpec::new(TAG_TEXT, "text_value", ValueKind::Text, Value::Null),
            ],
        )
    }

    fn to_fields(&self) -> FieldRecord {
        let mut record = FieldRecord::default();
        record.set(TAG_BOOL, Value::from(self.bool_value));
        record.set(TAG_INTEGER, Value::from(self.integer_value));
        record.set(TAG_TEXT, Value::from(self.text_value.clone()));
        record
    }

    fn from_fields(record: &FieldRecord) -> Self {
        Self {
            bool_value: record.bool_at(TAG_BOOL),
            integer_value: record.integer_at(TAG_INTEGER),
            text_value: record.text_at(TAG_TEXT).map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_round_trip() {
        let schema = SettingRecord::schema().unwrap();

        for record in [
            SettingRecord::of_bool(true),
            SettingRecord::of_integer(-3),
            SettingRecord::of_text("night"),
            SettingRecord::default(),
        ] {
            let bytes = schema.encode(&record.to_fields());
            let decoded = SettingRecord::from_fields(&schema.decode(&bytes).unwrap());
            assert_eq!(decoded, record);
        }
    }

    #[test]
    fn only_one_slot_is_set() {
        let record = SettingRecord::of_text("day");
        assert!(record.bool_value.is_none());
        assert!(record.integer_value.is_none());
        assert_eq!(record.text_value.as_deref(), Some("day"));
    }
}
