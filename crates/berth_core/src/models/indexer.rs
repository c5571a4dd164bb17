//! Saved indexer endpoints.

use crate::record::BoxRecord;
use berth_codec::{CodecResult, FieldRecord, FieldSpec, Schema, TypeId, Value, ValueKind};

/// A saved Usenet or torrent indexer endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Indexer {
    /// Display name.
    pub name: String,
    /// Base URL of the indexer API.
    pub host: String,
    /// API key or credential.
    pub api_key: String,
    /// Extra header name/value pairs sent with every request.
    pub headers: Vec<(String, String)>,
}

const TAG_NAME: u16 = 0;
const TAG_HOST: u16 = 1;
const TAG_API_KEY: u16 = 2;
const TAG_HEADERS: u16 = 3;

impl Indexer {
    /// Creates an indexer with the given name and empty connection details.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl BoxRecord for Indexer {
    const TYPE_ID: TypeId = TypeId::new(3);

    fn schema() -> CodecResult<Schema> {
        Schema::new(
            Self::TYPE_ID,
            "indexer",
            vec![
                FieldSpec::new(TAG_NAME, "name", ValueKind::Text, Value::Text(String::new())),
                FieldSpec::new(TAG_HOST, "host", ValueKind::Text, Value::Text(String::new())),
                FieldSpec::new(
                    TAG_API_KEY,
                    "api_key",
                    ValueKind::Text,
                    Value::Text(String::new()),
                ),
                FieldSpec::new(TAG_HEADERS, "headers", ValueKind::Map, Value::Map(Vec::new())),
            ],
        )
    }

    fn to_fields(&self) -> FieldRecord {
        let mut record = FieldRecord::default();
        record.set(TAG_NAME, Value::Text(self.name.clone()));
        record.set(TAG_HOST, Value::Text(self.host.clone()));
        record.set(TAG_API_KEY, Value::Text(self.api_key.clone()));
        record.set(TAG_HEADERS, Value::map(self.headers.clone()));
        record
    }

    fn from_fields(record: &FieldRecord) -> Self {
        Self {
            name: record.text_at(TAG_NAME).unwrap_or_default().to_string(),
            host: record.text_at(TAG_HOST).unwrap_or_default().to_string(),
            api_key: record.text_at(TAG_API_KEY).unwrap_or_default().to_string(),
            headers: record.map_at(TAG_HEADERS).unwrap_or_default().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_round_trip() {
        let indexer = Indexer {
            name: "nzb.example".to_string(),
            host: "https://nzb.example/api".to_string(),
            api_key: "k1".to_string(),
            headers: vec![("User-Agent".to_string(), "berth".to_string())],
        };
        let schema = Indexer::schema().unwrap();

        let bytes = schema.encode(&indexer.to_fields());
        let decoded = Indexer::from_fields(&schema.decode(&bytes).unwrap());

        assert_eq!(decoded, indexer);
    }

    #[test]
    fn new_indexer_is_empty_apart_from_name() {
        let indexer = Indexer::new("fresh");
        assert_eq!(indexer.name, "fresh");
        assert!(indexer.host.is_empty());
        assert!(indexer.api_key.is_empty());
        assert!(indexer.headers.is_empty());
    }
}
