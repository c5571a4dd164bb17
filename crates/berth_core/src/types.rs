//! Core type definitions for berth.

use std::fmt;

/// Key of a record within a box.
///
/// Keyed boxes (profiles, settings) use text keys; list-like boxes
/// (indexers, logs, alerts) use per-box monotonic serial keys. Serial
/// keys order numerically, so iteration over a serial-keyed box follows
/// insertion order - for the logs box that means chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoxKey {
    /// Generated monotonic identifier.
    Serial(u64),
    /// Caller-chosen text key.
    Text(String),
}

impl BoxKey {
    /// Creates a text key.
    #[must_use]
    pub fn text(key: impl Into<String>) -> Self {
        BoxKey::Text(key.into())
    }

    /// Creates a serial key.
    #[must_use]
    pub const fn serial(id: u64) -> Self {
        BoxKey::Serial(id)
    }

    /// The text form of this key, if it is a text key.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            BoxKey::Text(s) => Some(s),
            BoxKey::Serial(_) => None,
        }
    }

    /// The serial value of this key, if it is a serial key.
    #[must_use]
    pub fn as_serial(&self) -> Option<u64> {
        match self {
            BoxKey::Serial(n) => Some(*n),
            BoxKey::Text(_) => None,
        }
    }
}

impl fmt::Display for BoxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxKey::Serial(n) => write!(f, "#{n}"),
            BoxKey::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for BoxKey {
    fn from(s: &str) -> Self {
        BoxKey::Text(s.to_string())
    }
}

impl From<String> for BoxKey {
    fn from(s: String) -> Self {
        BoxKey::Text(s)
    }
}

impl From<u64> for BoxKey {
    fn from(n: u64) -> Self {
        BoxKey::Serial(n)
    }
}

/// Returns the current time as unix milliseconds.
#[must_use]
pub fn unix_millis_now() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
