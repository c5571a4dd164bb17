//! Record schemas: declared fields, defaults, and decode backfill.

use crate::error::{CodecError, CodecResult};
use crate::value::{Value, ValueKind};
use crate::wire;
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier for a record type.
///
/// Type identifiers are never reused, even after a record type is
/// retired; see [`crate::SchemaRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub u16);

impl TypeId {
    /// Creates a new type identifier.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type:{}", self.0)
    }
}

/// Declaration of a single record field.
///
/// The tag is the field's wire identity and must never be reused for a
/// different meaning once data has been written with it.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Stable numeric tag.
    pub tag: u16,
    /// Human-readable field name (used by the backup projection).
    pub name: &'static str,
    /// Declared value kind. `Null` values are accepted for any kind,
    /// which is how optional fields are expressed.
    pub kind: ValueKind,
    /// Value used when the field is absent from stored bytes.
    pub default: Value,
}

impl FieldSpec {
    /// Creates a field declaration.
    #[must_use]
    pub fn new(tag: u16, name: &'static str, kind: ValueKind, default: Value) -> Self {
        Self {
            tag,
            name,
            kind,
            default,
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        value.is_null() || value.kind() == self.kind
    }
}

/// The declared shape of one record type.
#[derive(Debug, Clone)]
pub struct Schema {
    type_id: TypeId,
    name: &'static str,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Creates a schema, validating the field declarations.
    ///
    /// # Errors
    ///
    /// Fails if two fields share a tag, or a default value does not
    /// satisfy its field's declared kind.
    pub fn new(type_id: TypeId, name: &'static str, fields: Vec<FieldSpec>) -> CodecResult<Self> {
        let mut seen = BTreeMap::new();
        for field in &fields {
            if seen.insert(field.tag, ()).is_some() {
                return Err(CodecError::DuplicateFieldTag {
                    name: name.to_string(),
                    tag: field.tag,
                });
            }
            if !field.accepts(&field.default) {
                return Err(CodecError::DefaultKindMismatch {
                    name: name.to_string(),
                    tag: field.tag,
                });
            }
        }
        Ok(Self {
            type_id,
            name,
            fields,
        })
    }

    /// Returns the schema's type identifier.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the schema's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the declared fields.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a field declaration by tag.
    #[must_use]
    pub fn field(&self, tag: u16) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Looks up a field declaration by name.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Encodes a field record to bytes.
    ///
    /// Only declared tags are written; anything else in the record is
    /// dropped (a record built through this schema cannot contain them).
    #[must_use]
    pub fn encode(&self, record: &FieldRecord) -> Vec<u8> {
        let fields: Vec<(u16, Value)> = self
            .fields
            .iter()
            .filter_map(|spec| record.get(spec.tag).map(|v| (spec.tag, v.clone())))
            .collect();
        wire::encode_fields(&fields)
    }

    /// Decodes record bytes under this schema.
    ///
    /// Schema evolution rules:
    /// - a declared tag absent from the bytes is backfilled from its
    ///   declared default (data written before the field existed);
    /// - a tag in the bytes that is not declared is skipped (data written
    ///   by a newer schema);
    /// - a declared tag whose stored kind matches neither the declared
    ///   kind nor `Null` is treated as absent and backfilled.
    ///
    /// # Errors
    ///
    /// Fails only on malformed bytes (truncation, unknown kind code,
    /// invalid UTF-8).
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<FieldRecord> {
        let raw = wire::decode_fields(bytes)?;
        let mut record = FieldRecord::default();

        for (tag, value) in raw {
            match self.field(tag) {
                Some(spec) if spec.accepts(&value) => {
                    record.set(tag, value);
                }
                // Unknown tag or mismatched kind: skip, backfill below.
                _ => {}
            }
        }

        for spec in &self.fields {
            if record.get(spec.tag).is_none() {
                record.set(spec.tag, spec.default.clone());
            }
        }

        Ok(record)
    }
}

/// A decoded record: values addressed by field tag.
///
/// After [`Schema::decode`], every declared tag is present and its value
/// satisfies the declared kind (or is `Null`), so the typed accessors
/// below are reliable for schema-driven code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRecord {
    values: BTreeMap<u16, Value>,
}

impl FieldRecord {
    /// Creates a record from `(tag, value)` pairs.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(u16, Value)>) -> Self {
        Self {
            values: pairs.into_iter().collect(),
        }
    }

    /// Sets a field value.
    pub fn set(&mut self, tag: u16, value: Value) {
        self.values.insert(tag, value);
    }

    /// Gets a field value by tag.
    #[must_use]
    pub fn get(&self, tag: u16) -> Option<&Value> {
        self.values.get(&tag)
    }

    /// Iterates over `(tag, value)` pairs in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Value)> {
        self.values.iter().map(|(tag, value)| (*tag, value))
    }

    /// Number of fields in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Boolean value at `tag`, if present and a boolean.
    #[must_use]
    pub fn bool_at(&self, tag: u16) -> Option<bool> {
        self.get(tag).and_then(Value::as_bool)
    }

    /// Integer value at `tag`, if present and an integer.
    #[must_use]
    pub fn integer_at(&self, tag: u16) -> Option<i64> {
        self.get(tag).and_then(Value::as_integer)
    }

    /// Text value at `tag`, if present and text.
    #[must_use]
    pub fn text_at(&self, tag: u16) -> Option<&str> {
        self.get(tag).and_then(Value::as_text)
    }

    /// Map entries at `tag`, if present and a map.
    #[must_use]
    pub fn map_at(&self, tag: u16) -> Option<&[(String, String)]> {
        self.get(tag).and_then(Value::as_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_schema_v1() -> Schema {
        Schema::new(
            TypeId::new(42),
            "user",
            vec![
                FieldSpec::new(0, "name", ValueKind::Text, Value::Text("unknown".into())),
                FieldSpec::new(1, "admin", ValueKind::Bool, Value::Bool(false)),
            ],
        )
        .unwrap()
    }

    fn user_schema_v2() -> Schema {
        Schema::new(
            TypeId::new(42),
            "user",
            vec![
                FieldSpec::new(0, "name", ValueKind::Text, Value::Text("unknown".into())),
                FieldSpec::new(1, "admin", ValueKind::Bool, Value::Bool(false)),
                FieldSpec::new(2, "login_count", ValueKind::Integer, Value::Integer(0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn encode_decode_round_trip() {
        let schema = user_schema_v1();
        let record = FieldRecord::from_pairs(vec![
            (0, Value::Text("alice".into())),
            (1, Value::Bool(true)),
        ]);

        let bytes = schema.encode(&record);
        let decoded = schema.decode(&bytes).unwrap();

        assert_eq!(decoded, record);
    }

    #[test]
    fn absent_field_backfills_default() {
        let v1 = user_schema_v1();
        let v2 = user_schema_v2();

        let record = FieldRecord::from_pairs(vec![
            (0, Value::Text("alice".into())),
            (1, Value::Bool(true)),
        ]);
        let bytes = v1.encode(&record);

        // Old bytes decoded under the newer schema gain the new field's default.
        let decoded = v2.decode(&bytes).unwrap();
        assert_eq!(decoded.text_at(0), Some("alice"));
        assert_eq!(decoded.bool_at(1), Some(true));
        assert_eq!(decoded.integer_at(2), Some(0));
    }

    #[test]
    fn unknown_field_is_skipped() {
        let v1 = user_schema_v1();
        let v2 = user_schema_v2();

        let record = FieldRecord::from_pairs(vec![
            (0, Value::Text("bob".into())),
            (1, Value::Bool(false)),
            (2, Value::Integer(99)),
        ]);
        let bytes = v2.encode(&record);

        // Newer bytes decoded under the older schema silently drop tag 2.
        let decoded = v1.decode(&bytes).unwrap();
        assert_eq!(decoded.text_at(0), Some("bob"));
        assert_eq!(decoded.get(2), None);
    }

    #[test]
    fn mismatched_kind_backfills_default() {
        let schema = user_schema_v1();

        // Tag 1 is declared bool but carries text on the wire.
        let bytes = crate::wire::encode_fields(&[
            (0, Value::Text("eve".into())),
            (1, Value::Text("not-a-bool".into())),
        ]);

        let decoded = schema.decode(&bytes).unwrap();
        assert_eq!(decoded.bool_at(1), Some(false));
    }

    #[test]
    fn null_accepted_for_any_kind() {
        let schema = Schema::new(
            TypeId::new(7),
            "log",
            vec![FieldSpec::new(
                0,
                "error",
                ValueKind::Text,
                Value::Null,
            )],
        )
        .unwrap();

        let bytes = crate::wire::encode_fields(&[(0, Value::Null)]);
        let decoded = schema.decode(&bytes).unwrap();
        assert!(decoded.get(0).unwrap().is_null());
        assert_eq!(decoded.text_at(0), None);
    }

    #[test]
    fn duplicate_tag_rejected() {
        let result = Schema::new(
            TypeId::new(1),
            "bad",
            vec![
                FieldSpec::new(0, "a", ValueKind::Bool, Value::Bool(false)),
                FieldSpec::new(0, "b", ValueKind::Bool, Value::Bool(false)),
            ],
        );
        assert!(matches!(
            result,
            Err(CodecError::DuplicateFieldTag { tag: 0, .. })
        ));
    }

    #[test]
    fn default_kind_mismatch_rejected() {
        let result = Schema::new(
            TypeId::new(1),
            "bad",
            vec![FieldSpec::new(
                0,
                "a",
                ValueKind::Bool,
                Value::Text("oops".into()),
            )],
        );
        assert!(matches!(
            result,
            Err(CodecError::DefaultKindMismatch { tag: 0, .. })
        ));
    }

    #[test]
    fn field_lookup_by_name() {
        let schema = user_schema_v1();
        assert_eq!(schema.field_by_name("admin").map(|f| f.tag), Some(1));
        assert!(schema.field_by_name("missing").is_none());
    }
}
