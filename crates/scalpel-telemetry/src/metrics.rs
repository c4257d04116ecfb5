//! Prometheus-backed metrics registry.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Logger counters are mirrored into gauges on demand via [`Metrics::observe_logger`]
//!   rather than from the logging hot path.

use std::convert::TryFrom;
use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::error::{Result, TelemetryError};
use crate::logger::LoggerStats;

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    log_records_written: IntGaugeVec,
    log_records_failed: IntGaugeVec,
    log_lines_dropped: IntGauge,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests received"),
            &["route", "code"],
        )
        .map_err(|source| collector_error("http_requests_total", source))?;
        let log_records_written = IntGaugeVec::new(
            Opts::new("log_records_written", "Log records written per sink"),
            &["sink"],
        )
        .map_err(|source| collector_error("log_records_written", source))?;
        let log_records_failed = IntGaugeVec::new(
            Opts::new(
                "log_records_failed",
                "Log records lost to encode or write failures per sink",
            ),
            &["sink"],
        )
        .map_err(|source| collector_error("log_records_failed", source))?;
        let log_lines_dropped = IntGauge::with_opts(Opts::new(
            "log_lines_dropped",
            "Lines dropped by the background file writer",
        ))
        .map_err(|source| collector_error("log_lines_dropped", source))?;

        register(&registry, "http_requests_total", http_requests_total.clone())?;
        register(&registry, "log_records_written", log_records_written.clone())?;
        register(&registry, "log_records_failed", log_records_failed.clone())?;
        register(&registry, "log_lines_dropped", log_lines_dropped.clone())?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                log_records_written,
                log_records_failed,
                log_lines_dropped,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        let code = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[route, code.as_str()])
            .inc();
    }

    /// Copy the logger's per-sink counters into the gauges.
    pub fn observe_logger(&self, stats: &LoggerStats) {
        for sink in &stats.sinks {
            self.inner
                .log_records_written
                .with_label_values(&[sink.name])
                .set(Self::saturating_i64(sink.written));
            self.inner
                .log_records_failed
                .with_label_values(&[sink.name])
                .set(Self::saturating_i64(sink.failed));
        }
        self.inner
            .log_lines_dropped
            .set(Self::saturating_i64(stats.dropped_lines));
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Metrics {
                operation: "encode",
                metric: "registry",
                source,
            })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    pub(crate) fn saturating_i64(value: u64) -> i64 {
        i64::try_from(value).unwrap_or(i64::MAX)
    }
}

fn collector_error(metric: &'static str, source: prometheus::Error) -> TelemetryError {
    TelemetryError::Metrics {
        operation: "build",
        metric,
        source,
    }
}

fn register<C>(registry: &Registry, metric: &'static str, collector: C) -> Result<()>
where
    C: prometheus::core::Collector + 'static,
{
    registry
        .register(Box::new(collector))
        .map_err(|source| TelemetryError::Metrics {
            operation: "register",
            metric,
            source,
        })
}
