//! Independently thresholded, independently encoded output destinations.
//!
//! # Design
//! - Each sink owns its writer behind a mutex; a record is encoded into a private
//!   buffer first and written with one `write_all`, so concurrent callers never
//!   interleave within a line.
//! - Write and encode failures are counted on the sink and never returned to callers.
//! - A sink feeding a background writer reports that writer's [`DeliveryCounters`], so
//!   its counters describe lines on disk rather than lines queued.
//! - A poisoned mutex is recovered rather than propagated.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::delivery::DeliveryCounters;
use crate::encode::Encoding;
use crate::level::LogLevel;
use crate::record::Record;

/// Writer type stored by a sink.
pub type BoxedWriter = Box<dyn Write + Send>;

/// One fan-out branch of a [`crate::Logger`].
pub struct Sink {
    name: &'static str,
    threshold: LogLevel,
    encoding: Encoding,
    writer: Mutex<BoxedWriter>,
    written: AtomicU64,
    failed: AtomicU64,
    delivery: Option<Arc<DeliveryCounters>>,
}

/// Point-in-time counters for a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkStats {
    /// Sink name (`file`, `console`, ...).
    pub name: &'static str,
    /// Minimum accepted level.
    pub threshold: LogLevel,
    /// Records written successfully.
    pub written: u64,
    /// Records lost to encode or write failures.
    pub failed: u64,
}

impl Sink {
    /// Create a sink writing `encoding`-formatted records at or above `threshold`.
    pub fn new(
        name: &'static str,
        threshold: LogLevel,
        encoding: Encoding,
        writer: impl Write + Send + 'static,
    ) -> Self {
        Self {
            name,
            threshold,
            encoding,
            writer: Mutex::new(Box::new(writer)),
            written: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            delivery: None,
        }
    }

    /// Report written and failed lines from `counters`, which the writer behind this
    /// sink updates once a line is actually delivered.
    #[must_use]
    pub fn with_delivery(mut self, counters: Arc<DeliveryCounters>) -> Self {
        self.delivery = Some(counters);
        self
    }

    /// JSON-lines sink.
    pub fn json(
        name: &'static str,
        threshold: LogLevel,
        writer: impl Write + Send + 'static,
    ) -> Self {
        Self::new(name, threshold, Encoding::Json, writer)
    }

    /// Human-readable sink.
    pub fn console(
        name: &'static str,
        threshold: LogLevel,
        color: bool,
        writer: impl Write + Send + 'static,
    ) -> Self {
        Self::new(name, threshold, Encoding::Console { color }, writer)
    }

    /// Sink name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Minimum level this sink accepts.
    #[must_use]
    pub const fn threshold(&self) -> LogLevel {
        self.threshold
    }

    /// Whether a record at `level` would be written.
    #[must_use]
    pub fn accepts(&self, level: LogLevel) -> bool {
        level.enabled_for(self.threshold)
    }

    /// Encode and write `record` if it passes the threshold. Returns whether it was
    /// written; failures are counted, never raised.
    pub fn emit(&self, record: &Record) -> bool {
        if !self.accepts(record.level) {
            return false;
        }
        let mut buf = Vec::with_capacity(256);
        if self.encoding.encode(record, &mut buf).is_err() {
            self.failed.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        match self.lock().write_all(&buf) {
            Ok(()) => {
                if self.delivery.is_none() {
                    self.written.fetch_add(1, Ordering::Relaxed);
                }
                true
            }
            Err(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Flush the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns the writer's flush error.
    pub fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> SinkStats {
        let local_written = self.written.load(Ordering::Relaxed);
        let local_failed = self.failed.load(Ordering::Relaxed);
        let (written, failed) = match &self.delivery {
            Some(delivery) => (delivery.written(), local_failed + delivery.failed()),
            None => (local_written, local_failed),
        };
        SinkStats {
            name: self.name,
            threshold: self.threshold,
            written,
            failed,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoxedWriter> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Sink")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}
