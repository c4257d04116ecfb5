//! Fan-out logger handle.
//!
//! # Design
//! - A record is built once per call (timestamp, caller, fields) and offered to every
//!   sink; each sink applies its own threshold and encoding.
//! - The handle is an `Arc`, cheap to clone and safe to share across threads.
//! - The background file writer's guard lives inside the handle; `shutdown` (or dropping
//!   the last clone) drains it so buffered lines reach disk.

use std::fmt;
use std::panic::Location;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing_appender::non_blocking::{ErrorCounter, WorkerGuard};

use crate::level::LogLevel;
use crate::record::{Caller, Record};
use crate::sink::{Sink, SinkStats};

/// Shared logging handle writing to one or more sinks.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    sinks: Vec<Sink>,
    development: bool,
    worker: Mutex<Option<WorkerGuard>>,
    dropped: Option<ErrorCounter>,
}

/// Counters across every sink of a logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerStats {
    /// Per-sink counters in sink order.
    pub sinks: Vec<SinkStats>,
    /// Lines discarded because the background file writer's buffer was full.
    pub dropped_lines: u64,
}

impl LoggerStats {
    /// Counters for the sink named `name`.
    #[must_use]
    pub fn sink(&self, name: &str) -> Option<&SinkStats> {
        self.sinks.iter().find(|stats| stats.name == name)
    }
}

/// Builder for [`Logger`].
#[derive(Default)]
pub struct LoggerBuilder {
    sinks: Vec<Sink>,
    development: bool,
    worker: Option<WorkerGuard>,
    dropped: Option<ErrorCounter>,
}

impl LoggerBuilder {
    /// Add a sink; records are offered to sinks in insertion order.
    #[must_use]
    pub fn sink(mut self, sink: Sink) -> Self {
        self.sinks.push(sink);
        self
    }

    /// In development mode `dpanic` panics after logging.
    #[must_use]
    pub const fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Attach the guard and drop counter of a background writer feeding one of the sinks.
    #[must_use]
    pub fn background_writer(mut self, guard: WorkerGuard, dropped: ErrorCounter) -> Self {
        self.worker = Some(guard);
        self.dropped = Some(dropped);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Logger {
        Logger {
            inner: Arc::new(LoggerInner {
                sinks: self.sinks,
                development: self.development,
                worker: Mutex::new(self.worker),
                dropped: self.dropped,
            }),
        }
    }
}

impl Logger {
    /// Start building a logger from explicit sinks.
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Whether any sink accepts records at `level`.
    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.inner.sinks.iter().any(|sink| sink.accepts(level))
    }

    /// Log at `debug`.
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, &[]);
    }

    /// Log at `info`.
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, &[]);
    }

    /// Log at `warn`.
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message, &[]);
    }

    /// Log at `error`.
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message, &[]);
    }

    /// Log at `debug` with structured fields.
    #[track_caller]
    pub fn debug_with(&self, message: impl Into<String>, fields: &[(&str, Value)]) {
        self.log(LogLevel::Debug, message, fields);
    }

    /// Log at `info` with structured fields.
    #[track_caller]
    pub fn info_with(&self, message: impl Into<String>, fields: &[(&str, Value)]) {
        self.log(LogLevel::Info, message, fields);
    }

    /// Log at `warn` with structured fields.
    #[track_caller]
    pub fn warn_with(&self, message: impl Into<String>, fields: &[(&str, Value)]) {
        self.log(LogLevel::Warn, message, fields);
    }

    /// Log at `error` with structured fields.
    #[track_caller]
    pub fn error_with(&self, message: impl Into<String>, fields: &[(&str, Value)]) {
        self.log(LogLevel::Error, message, fields);
    }

    /// Log at `dpanic`; panics afterwards when the logger is in development mode.
    ///
    /// # Panics
    ///
    /// Panics with `message` in development mode.
    #[track_caller]
    pub fn dpanic(&self, message: impl Into<String>) {
        let record = Self::record(LogLevel::DPanic, message, &[]);
        self.emit(&record);
        if self.inner.development {
            self.flush();
            panic!("{}", record.message);
        }
    }

    /// Log at `panic`, flush, then panic with `message`.
    ///
    /// # Panics
    ///
    /// Always.
    #[track_caller]
    pub fn panic(&self, message: impl Into<String>) -> ! {
        let record = Self::record(LogLevel::Panic, message, &[]);
        self.emit(&record);
        self.flush();
        panic!("{}", record.message);
    }

    /// Log at `fatal`, drain every sink, then exit the process with status 1.
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) -> ! {
        let record = Self::record(LogLevel::Fatal, message, &[]);
        self.emit(&record);
        self.shutdown();
        std::process::exit(1);
    }

    /// Log at `level` with structured fields, capturing the caller's location.
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>, fields: &[(&str, Value)]) {
        if !self.enabled(level) {
            return;
        }
        let record = Self::record(level, message, fields);
        self.emit(&record);
    }

    /// Offer a prepared record to every sink.
    pub fn emit(&self, record: &Record) {
        for sink in &self.inner.sinks {
            sink.emit(record);
        }
    }

    /// Flush every sink, ignoring failures.
    pub fn flush(&self) {
        for sink in &self.inner.sinks {
            let _ = sink.flush();
        }
    }

    /// Flush every sink and drain the background file writer. Idempotent.
    pub fn shutdown(&self) {
        self.flush();
        let guard = self
            .inner
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(guard);
    }

    /// Counters for every sink.
    #[must_use]
    pub fn stats(&self) -> LoggerStats {
        LoggerStats {
            sinks: self.inner.sinks.iter().map(Sink::stats).collect(),
            dropped_lines: self
                .inner
                .dropped
                .as_ref()
                .map_or(0, |counter| counter.dropped_lines() as u64),
        }
    }

    #[track_caller]
    fn record(level: LogLevel, message: impl Into<String>, fields: &[(&str, Value)]) -> Record {
        Record::new(level, Caller::from_location(Location::caller()), message, fields)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Logger")
            .field("sinks", &self.inner.sinks)
            .field("development", &self.inner.development)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalpel_test_support::capture::{FailingWriter, SharedBuffer};
    use serde_json::json;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::thread;

    fn logger(
        file_level: LogLevel,
        console_level: LogLevel,
    ) -> (Logger, SharedBuffer, SharedBuffer) {
        let file = SharedBuffer::new();
        let console = SharedBuffer::new();
        let logger = Logger::builder()
            .sink(Sink::json("file", file_level, file.clone()))
            .sink(Sink::console("console", console_level, false, console.clone()))
            .build();
        (logger, file, console)
    }

    #[test]
    fn sinks_filter_independently() {
        let (logger, file, console) = logger(LogLevel::Error, LogLevel::Debug);
        logger.info("only on console");
        logger.error("on both");

        let file_lines = file.lines();
        let console_lines = console.lines();
        assert_eq!(file_lines.len(), 1);
        assert!(file_lines[0].contains("on both"));
        assert_eq!(console_lines.len(), 2);
        assert!(console_lines[0].contains("[INFO]"));
        assert!(console_lines[0].contains("only on console"));
    }

    #[test]
    fn debug_can_reach_file_while_console_stays_quiet() {
        let (logger, file, console) = logger(LogLevel::Debug, LogLevel::Info);
        logger.debug("verbose");
        assert_eq!(file.lines().len(), 1);
        assert!(console.lines().is_empty());
        assert!(logger.enabled(LogLevel::Debug));
    }

    #[test]
    fn caller_points_at_call_site() -> anyhow::Result<()> {
        let (logger, file, _console) = logger(LogLevel::Debug, LogLevel::Debug);
        let line = line!() + 1;
        logger.warn_with("with fields", &[("attempt", json!(3))]);
        let record: Value = serde_json::from_str(&file.lines()[0])?;
        assert_eq!(record["caller"], json!(format!("src/logger.rs:{line}")));
        assert_eq!(record["attempt"], json!(3));
        assert_eq!(record["level"], json!("warn"));
        Ok(())
    }

    #[test]
    fn failing_file_sink_does_not_block_console() {
        let console = SharedBuffer::new();
        let logger = Logger::builder()
            .sink(Sink::json("file", LogLevel::Debug, FailingWriter))
            .sink(Sink::console("console", LogLevel::Debug, false, console.clone()))
            .build();
        logger.error("first");
        logger.info("second");
        logger.flush();

        assert_eq!(console.lines().len(), 2);
        let stats = logger.stats();
        assert_eq!(stats.sink("file").map(|sink| sink.failed), Some(2));
        assert_eq!(stats.sink("console").map(|sink| sink.written), Some(2));
        assert_eq!(stats.dropped_lines, 0);
    }

    #[test]
    fn concurrent_writers_produce_whole_lines() {
        let console = SharedBuffer::new();
        let logger = Logger::builder()
            .sink(Sink::console("console", LogLevel::Debug, true, console.clone()))
            .build();

        let handles: Vec<_> = (0..100)
            .map(|worker| {
                let logger = logger.clone();
                thread::spawn(move || {
                    for seq in 0..100 {
                        logger.info_with("tick", &[("worker", json!(worker)), ("seq", json!(seq))]);
                    }
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().is_ok());
        }

        let lines = console.lines();
        assert_eq!(lines.len(), 10_000);
        for line in &lines {
            let parts: Vec<&str> = line.split('\t').collect();
            assert_eq!(parts.len(), 5, "malformed line: {line:?}");
            assert!(parts[1].contains("[INFO]"));
            assert_eq!(parts[3], "tick");
            let fields: Value = serde_json::from_str(parts[4]).unwrap_or(Value::Null);
            assert!(fields["worker"].is_u64() && fields["seq"].is_u64());
        }
    }

    #[test]
    fn dpanic_only_panics_in_development() {
        let (logger, file, _console) = logger(LogLevel::Debug, LogLevel::Debug);
        logger.dpanic("tolerated");
        assert_eq!(file.lines().len(), 1);

        let strict = Logger::builder()
            .sink(Sink::json("file", LogLevel::Debug, file.clone()))
            .development(true)
            .build();
        let outcome = catch_unwind(AssertUnwindSafe(|| strict.dpanic("strict")));
        assert!(outcome.is_err());
        assert_eq!(file.lines().len(), 2);
        assert!(file.lines()[1].contains("\"level\":\"dpanic\""));
    }

    #[test]
    fn panic_logs_before_unwinding() {
        let (logger, file, console) = logger(LogLevel::Debug, LogLevel::Debug);
        let outcome = catch_unwind(AssertUnwindSafe(|| logger.panic("boom")));
        assert!(outcome.is_err());
        assert!(file.lines()[0].contains("\"level\":\"panic\""));
        assert!(console.lines()[0].contains("[PANIC]"));
    }

    #[test]
    fn shutdown_is_idempotent() {
        let (logger, _file, _console) = logger(LogLevel::Info, LogLevel::Info);
        logger.shutdown();
        logger.shutdown();
        logger.info("still safe");
    }
}
