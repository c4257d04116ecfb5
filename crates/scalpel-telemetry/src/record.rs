//! Log record model shared by the encoders.

use std::fmt::{self, Display, Formatter};
use std::panic::Location;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::level::LogLevel;

/// Keys owned by the encoders; user fields with these names are prefixed with `_`.
pub const RESERVED_KEYS: [&str; 4] = ["level", "ts", "caller", "msg"];

/// Call-site location of a log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Source file as reported by the compiler.
    pub file: String,
    /// One-based line number.
    pub line: u32,
}

impl Caller {
    /// Build a caller from a `#[track_caller]` location.
    #[must_use]
    pub fn from_location(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
        }
    }

    /// `file:line` with the file trimmed to its final directory and file name.
    #[must_use]
    pub fn trimmed(&self) -> String {
        format!("{}:{}", trim_path(&self.file), self.line)
    }
}

impl Display for Caller {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.trimmed())
    }
}

/// A single log event, built once and offered to every sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Time the record was created.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: LogLevel,
    /// Call site.
    pub caller: Caller,
    /// Human-readable message.
    pub message: String,
    /// Structured key/value context.
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(
        level: LogLevel,
        caller: Caller,
        message: impl Into<String>,
        fields: &[(&str, Value)],
    ) -> Self {
        let mut map = Map::new();
        for (key, value) in fields {
            map.insert(field_key(key), value.clone());
        }
        Self {
            timestamp: Utc::now(),
            level,
            caller,
            message: message.into(),
            fields: map,
        }
    }
}

/// Rename keys that would collide with encoder-owned keys.
pub(crate) fn field_key(key: &str) -> String {
    if RESERVED_KEYS.contains(&key) {
        format!("_{key}")
    } else {
        key.to_string()
    }
}

/// Keep the last directory and file name of a path, like `src/logger.rs`.
fn trim_path(path: &str) -> &str {
    let is_separator = |c: char| c == '/' || c == '\\';
    let Some(last) = path.rfind(is_separator) else {
        return path;
    };
    match path[..last].rfind(is_separator) {
        Some(previous) => &path[previous + 1..],
        None => path,
    }
}
