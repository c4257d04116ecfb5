//! Logger factory.
//!
//! # Design
//! - The log directory is created before any sink exists, so a construction failure
//!   never leaves a partially built logger behind.
//! - File writes go through a lossy non-blocking channel to a worker thread owning the
//!   [`crate::rotate::RollingFile`]; its guard is handed to the logger for flush-on-shutdown.
//! - The worker writes through a [`CountingWriter`], so disk failures show up in the
//!   file sink's counters even though the queue itself never fails.
//! - Console output goes to stderr unless a writer is injected.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use scalpel_config::Validated;
use tracing_appender::non_blocking::NonBlockingBuilder;

use crate::bridge::install_global;
use crate::config::{LOG_FILE_NAME, LoggerConfig};
use crate::delivery::{CountingWriter, DeliveryCounters};
use crate::error::{Result, TelemetryError};
use crate::level::LogLevel;
use crate::logger::Logger;
use crate::rotate::open_rolling;
use crate::sink::Sink;

/// Name of the file sink in [`crate::LoggerStats`].
pub const FILE_SINK: &str = "file";
/// Name of the console sink in [`crate::LoggerStats`].
pub const CONSOLE_SINK: &str = "console";

const FILE_BUFFER_LINES: usize = 16_384;

/// Build the dual-sink logger described by `config`, writing console output to stderr.
///
/// # Errors
///
/// Returns [`TelemetryError::CreateLogDir`] or [`TelemetryError::OpenLogFile`] when the
/// file sink cannot be prepared, and [`TelemetryError::InvalidLevel`] when a level does
/// not parse.
pub fn build_logger(config: &Validated<LoggerConfig>) -> Result<Logger> {
    build_logger_with_console(config, std::io::stderr(), config.console.color.enabled())
}

/// Build the dual-sink logger with an explicit console writer and colour setting.
///
/// # Errors
///
/// See [`build_logger`].
pub fn build_logger_with_console(
    config: &Validated<LoggerConfig>,
    console: impl Write + Send + 'static,
    color: bool,
) -> Result<Logger> {
    let file_level = parse_level("logs.file.level", &config.file.level)?;
    let console_level = parse_level("logs.console.level", &config.console.level)?;

    let dir = Path::new(&config.file.path);
    fs::create_dir_all(dir).map_err(|source| TelemetryError::CreateLogDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(LOG_FILE_NAME);
    let rolling = open_rolling(&path, &config.file.rotation)
        .map_err(|source| TelemetryError::OpenLogFile { path, source })?;

    let delivery = Arc::new(DeliveryCounters::default());
    let (writer, guard) = NonBlockingBuilder::default()
        .lossy(true)
        .buffered_lines_limit(FILE_BUFFER_LINES)
        .thread_name("scalpel-log-writer")
        .finish(CountingWriter::new(rolling, Arc::clone(&delivery)));
    let dropped = writer.error_counter();

    Ok(Logger::builder()
        .sink(Sink::json(FILE_SINK, file_level, writer).with_delivery(delivery))
        .sink(Sink::console(CONSOLE_SINK, console_level, color, console))
        .background_writer(guard, dropped)
        .build())
}

/// Build the logger and install it as the global `tracing` subscriber.
///
/// # Errors
///
/// Returns any [`build_logger`] error, or [`TelemetryError::SubscriberInstall`] when a
/// global subscriber is already installed.
pub fn init_logging(config: &Validated<LoggerConfig>) -> Result<Logger> {
    let logger = build_logger(config)?;
    install_global(&logger)?;
    Ok(logger)
}

fn parse_level(field: &'static str, value: &str) -> Result<LogLevel> {
    value
        .parse()
        .map_err(|source| TelemetryError::InvalidLevel { field, source })
}
