//! # Design
//!
//! - Centralize application-level errors for bootstrap and the service lifecycle.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: scalpel_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: scalpel_telemetry::TelemetryError,
    },
    /// Application info could not be gathered.
    #[error("failed to gather application info")]
    Info {
        /// Info field that could not be resolved.
        field: &'static str,
        /// Source IO error.
        source: io::Error,
    },
    /// The HTTP listener could not be bound or served.
    #[error("http server operation failed")]
    Http {
        /// Operation identifier.
        operation: &'static str,
        /// Address involved in the failure.
        addr: SocketAddr,
        /// Source IO error.
        source: io::Error,
    },
    /// Waiting for the shutdown signal failed.
    #[error("failed to listen for shutdown signal")]
    Signal {
        /// Source IO error.
        source: io::Error,
    },
    /// A service was stopped while not running.
    #[error("service is not running")]
    NotRunning {
        /// Service name.
        service: &'static str,
    },
    /// A background task ended abnormally.
    #[error("background task failed")]
    Task {
        /// Service that owned the task.
        service: &'static str,
        /// Join failure description.
        reason: String,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: scalpel_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: scalpel_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }
}
