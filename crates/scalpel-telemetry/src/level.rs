//! Closed severity vocabulary shared by every sink.
//!
//! # Design
//! - The seven levels form a total order; filtering compares enum discriminants.
//! - Name, tag, and colour lookups are exhaustive matches, so adding a level without
//!   mapping it is a compile error rather than a silent fallback.
//! - Parsing is exact and case-sensitive: near-matches such as `Info` are rejected.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use scalpel_config::{ConfigResult, Validator};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Name under which [`is_valid_level`] is registered with the validator.
pub const LOG_LEVEL_RULE: &str = "loglevel";

/// Severity of a log record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Verbose diagnostics.
    Debug,
    /// Routine operational messages.
    Info,
    /// Unexpected but recoverable conditions.
    Warn,
    /// Failures that need attention.
    Error,
    /// Severe errors that panic in development builds of the logger.
    DPanic,
    /// Errors logged immediately before a panic.
    Panic,
    /// Errors logged immediately before the process exits.
    Fatal,
}

/// Colour class used when rendering a level tag on a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelColor {
    /// Debug records.
    Debug,
    /// Info records.
    Info,
    /// Warn records.
    Warn,
    /// Error records.
    Error,
    /// Shared by `dpanic`, `panic`, and `fatal`.
    Fatal,
}

impl LevelColor {
    /// ANSI SGR parameters for this colour class.
    #[must_use]
    pub const fn sgr(self) -> &'static str {
        match self {
            Self::Debug => "34",
            Self::Info => "32",
            Self::Warn => "33",
            Self::Error => "31",
            Self::Fatal => "1;35",
        }
    }
}

impl LogLevel {
    /// Every level in ascending severity.
    pub const ALL: [Self; 7] = [
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::DPanic,
        Self::Panic,
        Self::Fatal,
    ];

    /// Canonical lowercase name, as accepted in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::DPanic => "dpanic",
            Self::Panic => "panic",
            Self::Fatal => "fatal",
        }
    }

    /// Uppercase name used in console tags.
    #[must_use]
    pub const fn capital_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::DPanic => "DPANIC",
            Self::Panic => "PANIC",
            Self::Fatal => "FATAL",
        }
    }

    /// Colour class for console rendering.
    #[must_use]
    pub const fn color(self) -> LevelColor {
        match self {
            Self::Debug => LevelColor::Debug,
            Self::Info => LevelColor::Info,
            Self::Warn => LevelColor::Warn,
            Self::Error => LevelColor::Error,
            Self::DPanic | Self::Panic | Self::Fatal => LevelColor::Fatal,
        }
    }

    /// Whether a record at `self` passes a sink whose threshold is `threshold`.
    #[must_use]
    pub fn enabled_for(self, threshold: Self) -> bool {
        self >= threshold
    }
}

impl Display for LogLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error returned when a string is not one of the seven level names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level {value:?}")]
pub struct ParseLevelError {
    /// The rejected input.
    pub value: String,
}

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == value)
            .ok_or_else(|| ParseLevelError {
                value: value.to_string(),
            })
    }
}

/// Report whether `candidate` exactly names a level.
#[must_use]
pub fn is_valid_level(candidate: &str) -> bool {
    candidate.parse::<LogLevel>().is_ok()
}

/// Register the [`LOG_LEVEL_RULE`] rule so configuration models can reference it.
///
/// # Errors
///
/// Returns an error if the rule name is already registered.
pub fn register_log_level_validation(validator: &mut Validator) -> ConfigResult<()> {
    validator.register_rule(LOG_LEVEL_RULE, is_valid_level)
}
