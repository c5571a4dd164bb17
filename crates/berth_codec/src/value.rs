//! Dynamic field value type.

use std::fmt;

/// The kind of a [`Value`], used for schema declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Absent / nullable.
    Null,
    /// Boolean.
    Bool,
    /// Signed 64-bit integer.
    Integer,
    /// UTF-8 text.
    Text,
    /// String-to-string map (e.g. extra HTTP headers).
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Text => "text",
            ValueKind::Map => "map",
        };
        f.write_str(name)
    }
}

/// A dynamic record field value.
///
/// This is the closed set of shapes a record field can take. There are
/// deliberately no floats: everything the store holds is flags, counters,
/// names, hosts, credentials, and header maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Null value (absent optional field).
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (full i64 range; also used for unix-ms timestamps).
    Integer(i64),
    /// Text string (UTF-8).
    Text(String),
    /// String-to-string map, kept sorted by key for deterministic encoding.
    Map(Vec<(String, String)>),
}

impl Value {
    /// Create a map value with sorted, deduplicated keys.
    ///
    /// Later entries win on duplicate keys, matching "last write" intent.
    pub fn map(mut entries: Vec<(String, String)>) -> Self {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.dedup_by(|a, b| a.0 == b.0);
        Value::Map(entries)
    }

    /// The kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Text(_) => ValueKind::Text,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Check if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a string slice, if it is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as map entries, if it is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&[(String, String)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<(String, String)>> for Value {
    fn from(entries: Vec<(String, String)>) -> Self {
        Value::map(entries)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
