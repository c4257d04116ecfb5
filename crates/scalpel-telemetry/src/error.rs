//! Error types for logger construction, subscriber installation, and metrics export.

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;
use tracing_subscriber::util::TryInitError;

use crate::level::ParseLevelError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while constructing the logger or exporting metrics.
///
/// Only construction and export fail; once built, the logger counts write failures
/// instead of returning them.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log directory could not be created.
    #[error("failed to create log directory '{}'", path.display())]
    CreateLogDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The log file could not be opened for appending.
    #[error("failed to open log file '{}'", path.display())]
    OpenLogFile {
        /// File that could not be opened.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A configured level did not name a known level.
    #[error("invalid level for '{field}': {source}")]
    InvalidLevel {
        /// Configuration field holding the level.
        field: &'static str,
        /// Parse error carrying the received value.
        source: ParseLevelError,
    },
    /// Another global `tracing` subscriber was already installed.
    #[error("a global tracing subscriber is already installed")]
    SubscriberInstall {
        /// Underlying subscriber error.
        source: TryInitError,
    },
    /// A Prometheus collector could not be built, registered, or encoded.
    #[error("metrics {operation} failed for '{metric}'")]
    Metrics {
        /// Step that failed: `build`, `register`, or `encode`.
        operation: &'static str,
        /// Metric (or `registry`) involved.
        metric: &'static str,
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// Rendered metrics were not valid UTF-8.
    #[error("rendered metrics were not valid utf-8")]
    MetricsUtf8 {
        /// Underlying conversion error.
        source: FromUtf8Error,
    },
}
