//! `tracing` bridge that renders framework events through the dual-sink logger.
//!
//! # Design
//! - Libraries and lifecycle code log with `tracing` macros; this layer converts each
//!   event into a [`Record`] so it reaches the same file and console sinks.
//! - `tracing` has no levels above `ERROR`, so the mapping is onto the lower four
//!   levels of the vocabulary.

use std::fmt;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{Result, TelemetryError};
use crate::level::LogLevel;
use crate::logger::Logger;
use crate::record::{Caller, Record, field_key};

/// Layer forwarding `tracing` events to a [`Logger`].
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    /// Wrap `logger`.
    #[must_use]
    pub const fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

/// Map a `tracing` level onto the vocabulary.
#[must_use]
pub fn level_from_tracing(level: Level) -> LogLevel {
    match level {
        Level::TRACE | Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warn,
        Level::ERROR => LogLevel::Error,
    }
}

impl<S: Subscriber> Layer<S> for LoggerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = level_from_tracing(*metadata.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let caller = Caller {
            file: metadata.file().unwrap_or(metadata.target()).to_string(),
            line: metadata.line().unwrap_or_default(),
        };
        let mut record = Record::new(level, caller, visitor.message.unwrap_or_default(), &[]);
        record.fields = visitor.fields;
        self.logger.emit(&record);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field_key(field.name()), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }
}

/// Install a global subscriber whose only layer forwards events to `logger`.
///
/// # Errors
///
/// Returns [`TelemetryError::SubscriberInstall`] if a global subscriber is already set.
pub fn install_global(logger: &Logger) -> Result<()> {
    tracing_subscriber::registry()
        .with(LoggerLayer::new(logger.clone()))
        .try_init()
        .map_err(|source| TelemetryError::SubscriberInstall { source })
}
