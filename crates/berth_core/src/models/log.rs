//! Persisted application log entries.

use std::fmt;

use crate::record::BoxRecord;
use crate::types::unix_millis_now;
use berth_codec::{CodecResult, FieldRecord, FieldSpec, Schema, TypeId, Value, ValueKind};

/// Severity of a persisted log entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Routine information.
    #[default]
    Info,
    /// Something unexpected but recoverable.
    Warning,
    /// An operation failed.
    Error,
}

impl LogLevel {
    /// The stored text form of this level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }

    /// Parses a stored level, falling back to `Info` on unknown text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text {
            "debug" => LogLevel::Debug,
            "warning" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted application log entry.
///
/// Serial keys make iteration over the logs box chronological, so
/// trimming the oldest entries is a prefix delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Component that produced the entry.
    pub source: String,
    /// Human-readable message.
    pub message: String,
    /// Severity.
    pub level: LogLevel,
    /// Unix milliseconds when the entry was created.
    pub timestamp: i64,
    /// Error detail, when the entry records a failure.
    pub error: Option<String>,
    /// Stack or call trace, when one was captured.
    pub trace: Option<String>,
}

const TAG_SOURCE: u16 = 0;
const TAG_MESSAGE: u16 = 1;
const TAG_LEVEL: u16 = 2;
const TAG_TIMESTAMP: u16 = 3;
const TAG_ERROR: u16 = 4;
const TAG_TRACE: u16 = 5;

impl LogEntry {
    /// Creates an entry timestamped now.
    #[must_use]
    pub fn new(level: LogLevel, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            level,
            timestamp: unix_millis_now(),
            error: None,
            trace: None,
        }
    }

    /// Attaches error detail.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a captured trace.
    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }
}

impl BoxRecord for LogEntry {
    const TYPE_ID: TypeId = TypeId::new(5);

    fn schema() -> CodecResult<Schema> {
        Schema::new(
            Self::TYPE_ID,
            "log_entry",
            vec![
                FieldSpec::new(TAG_SOURCE, "source", ValueKind::Text, Value::Text(String::new())),
                FieldSpec::new(
                    TAG_MESSAGE,
                    "message",
                    ValueKind::Text,
                    Value::Text(String::new()),
                ),
                FieldSpec::new(
                    TAG_LEVEL,
                    "level",
                    ValueKind::Text,
                    Value::Text(LogLevel::Info.as_str().to_string()),
                ),
                FieldSpec::new(TAG_TIMESTAMP, "timestamp", ValueKind::Integer, Value::Integer(0)),
                FieldSpec::new(TAG_ERROR, "error", ValueKind::Text, Value::Null),
                FieldSpec::new(TAG_TRACE, "trace", ValueKind::Text, Value::Null),
            ],
        )
    }

    fn to_fields(&self) -> FieldRecord {
        let mut record = FieldRecord::default();
        record.set(TAG_SOURCE, Value::Text(self.source.clone()));
        record.set(TAG_MESSAGE, Value::Text(self.message.clone()));
        record.set(TAG_LEVEL, Value::Text(self.level.as_str().to_string()));
        record.set(TAG_TIMESTAMP, Value::Integer(self.timestamp));
        record.set(TAG_ERROR, Value::from(self.error.clone()));
        record.set(TAG_TRACE, Value::from(self.trace.clone()));
        record
    }

    fn from_fields(record: &FieldRecord) -> Self {
        Self {
            source: record.text_at(TAG_SOURCE).unwrap_or_default().to_string(),
            message: record.text_at(TAG_MESSAGE).unwrap_or_default().to_string(),
            level: LogLevel::parse(record.text_at(TAG_LEVEL).unwrap_or("info")),
            timestamp: record.integer_at(TAG_TIMESTAMP).unwrap_or(0),
            error: record.text_at(TAG_ERROR).map(str::to_string),
            trace: record.text_at(TAG_TRACE).map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_round_trip() {
        let entry = LogEntry::new(LogLevel::Error, "radarr", "request failed")
            .with_error("timeout after 30s")
            .with_trace("fetch -> send -> poll");
        let schema = LogEntry::schema().unwrap();

        let bytes = schema.encode(&entry.to_fields());
        let decoded = LogEntry::from_fields(&schema.decode(&bytes).unwrap());

        assert_eq!(decoded, entry);
    }

    #[test]
    fn optional_detail_stays_absent() {
        let entry = LogEntry::new(LogLevel::Info, "app", "started");
        let schema = LogEntry::schema().unwrap();

        let bytes = schema.encode(&entry.to_fields());
        let decoded = LogEntry::from_fields(&schema.decode(&bytes).unwrap());

        assert!(decoded.error.is_none());
        assert!(decoded.trace.is_none());
    }

    #[test]
    fn unknown_level_text_parses_as_info() {
        assert_eq!(LogLevel::parse("critical"), LogLevel::Info);
        assert_eq!(LogLevel::parse("warning"), LogLevel::Warning);
    }
}
