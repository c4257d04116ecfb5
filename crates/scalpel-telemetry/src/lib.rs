#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(unreachable_pub, clippy::all, clippy::pedantic, clippy::nursery)]

//! Dual-sink structured logging and metrics.
//!
//! A [`Logger`] fans every record out to a rotated JSON file (`<path>/server.log`)
//! and a human-readable stderr console, each with its own minimum level. Framework
//! code logging through `tracing` reaches the same sinks via [`LoggerLayer`].
//!
//! Layout: `level.rs` (vocabulary and validator), `config.rs` (`LoggerConfig` and
//! defaults), `record.rs`/`encode.rs` (record model and line encoders), `rotate.rs`
//! (size-rotated `server.log`), `delivery.rs` (disk outcome counters), `sink.rs` and
//! `logger.rs` (fan-out), `init.rs` (factory), `bridge.rs` (`tracing` layer),
//! `metrics.rs` (Prometheus registry).

pub mod bridge;
pub mod config;
pub mod delivery;
pub mod encode;
pub mod error;
pub mod init;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod rotate;
pub mod sink;

pub use bridge::{LoggerLayer, install_global};
pub use config::{
    ColorChoice, ConsoleConfig, FileConfig, LOG_FILE_NAME, LOGS_SECTION, LoggerConfig,
    RotationConfig, register_logging_defaults,
};
pub use delivery::{CountingWriter, DeliveryCounters};
pub use error::{Result, TelemetryError};
pub use init::{CONSOLE_SINK, FILE_SINK, build_logger, build_logger_with_console, init_logging};
pub use level::{
    LOG_LEVEL_RULE, LogLevel, ParseLevelError, is_valid_level, register_log_level_validation,
};
pub use logger::{Logger, LoggerBuilder, LoggerStats};
pub use metrics::Metrics;
pub use record::{Caller, Record};
pub use sink::{Sink, SinkStats};
