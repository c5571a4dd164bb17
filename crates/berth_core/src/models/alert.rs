//! Persisted in-app alerts.

use crate::record::BoxRecord;
use crate::types::unix_millis_now;
use berth_codec::{CodecResult, FieldRecord, FieldSpec, Schema, TypeId, Value, ValueKind};

/// An in-app notification shown to the user until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEntry {
    /// Short headline.
    pub title: String,
    /// Longer body text.
    pub body: String,
    /// Unix milliseconds when the alert was raised.
    pub timestamp: i64,
    /// Whether the user has seen the alert.
    pub read: bool,
}

const TAG_TITLE: u16 = 0;
const TAG_BODY: u16 = 1;
const TAG_TIMESTAMP: u16 = 2;
const TAG_READ: u16 = 3;

impl AlertEntry {
    /// Creates an unread alert timestamped now.
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            timestamp: unix_millis_now(),
            read: false,
        }
    }
}

impl BoxRecord for AlertEntry {
    const TYPE_ID: TypeId = TypeId::new(6);

    fn schema() -> CodecResult<Schema> {
        Schema::new(
            Self::TYPE_ID,
            "alert_entry",
            vec![
                FieldSpec::new(TAG_TITLE, "title", ValueKind::Text, Value::Text(String::new())),
                FieldSpec::new(TAG_BODY, "body", ValueKind::Text, Value::Text(String::new())),
                FieldSpec::new(TAG_TIMESTAMP, "timestamp", ValueKind::Integer, Value::Integer(0)),
                FieldSpec::new(TAG_READ, "read", ValueKind::Bool, Value::Bool(false)),
            ],
        )
    }

    fn to_fields(&self) -> FieldRecord {
        let mut record = FieldRecord::default();
        record.set(TAG_TITLE, Value::Text(self.title.clone()));
        record.set(TAG_BODY, Value::Text(self.body.clone()));
        record.set(TAG_TIMESTAMP, Value::Integer(self.timestamp));
        record.set(TAG_READ, Value::Bool(self.read));
        record
    }

    fn from_fields(record: &FieldRecord) -> Self {
        Self {
            title: record.text_at(TAG_TITLE).unwrap_or_default().to_string(),
            body: record.text_at(TAG_BODY).unwrap_or_default().to_string(),
            timestamp: record.integer_at(TAG_TIMESTAMP).unwrap_or(0),
            read: record.bool_at(TAG_READ).unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_round_trip() {
        let mut alert = AlertEntry::new("update available", "v2.1 is out");
        alert.read = true;
        let schema = AlertEntry::schema().unwrap();

        let bytes = schema.encode(&alert.to_fields());
        let decoded = AlertEntry::from_fields(&schema.decode(&bytes).unwrap());

        assert_eq!(decoded, alert);
    }

    #[test]
    fn new_alert_is_unread() {
        assert!(!AlertEntry::new("t", "b").read);
    }
}
