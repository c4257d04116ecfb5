//! Health and metrics HTTP endpoints.
//!
//! # Design
//! - `GET /health` returns the application info; `GET /metrics` renders Prometheus text
//!   after refreshing the logger gauges.
//! - Every request gets an `x-request-id`, generated when absent and echoed back.
//! - The server runs on a spawned task and stops through a graceful-shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use scalpel_telemetry::{Logger, Metrics};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::info::AppInfo;
use crate::lifecycle::Service;

const HEALTH_ROUTE: &str = "/health";
const METRICS_ROUTE: &str = "/metrics";
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Shared handler state.
pub(crate) struct HttpState {
    info: AppInfo,
    metrics: Metrics,
    logger: Logger,
}

#[derive(Serialize)]
pub(crate) struct HealthResponse<'a> {
    status: &'static str,
    info: &'a AppInfo,
}

/// Build the router serving `/health` and `/metrics`.
pub fn router(info: AppInfo, metrics: Metrics, logger: Logger) -> Router {
    let state = Arc::new(HttpState {
        info,
        metrics,
        logger,
    });
    Router::new()
        .route(HEALTH_ROUTE, get(health))
        .route(METRICS_ROUTE, get(metrics_text))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

pub(crate) async fn health(State(state): State<Arc<HttpState>>) -> Response {
    state
        .metrics
        .inc_http_request(HEALTH_ROUTE, StatusCode::OK.as_u16());
    Json(HealthResponse {
        status: "ok",
        info: &state.info,
    })
    .into_response()
}

pub(crate) async fn metrics_text(State(state): State<Arc<HttpState>>) -> Response {
    state
        .metrics
        .inc_http_request(METRICS_ROUTE, StatusCode::OK.as_u16());
    state.metrics.observe_logger(&state.logger.stats());
    match state.metrics.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)
            .body(Body::from(body))
            .unwrap_or_else(|err| {
                error!(error = %err, "failed to build metrics response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

struct Running {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

/// HTTP listener as a lifecycle service.
pub struct HttpService {
    addr: SocketAddr,
    router: Router,
    running: Option<Running>,
}

impl HttpService {
    /// Service that will bind `addr` and serve `router`.
    #[must_use]
    pub const fn new(addr: SocketAddr, router: Router) -> Self {
        Self {
            addr,
            router,
            running: None,
        }
    }

    /// Bound address while running; differs from the configured one when port `0` is used.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.addr)
    }
}

#[async_trait]
impl Service for HttpService {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn start(&mut self) -> AppResult<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| AppError::Http {
                operation: "bind",
                addr: self.addr,
                source,
            })?;
        let addr = listener.local_addr().map_err(|source| AppError::Http {
            operation: "local_addr",
            addr: self.addr,
            source,
        })?;
        let (shutdown, signal) = oneshot::channel::<()>();
        let router = self.router.clone();
        let task = tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(async move {
                    let _ = signal.await;
                })
                .await
        });
        info!(addr = %addr, "HTTP listener started");
        self.running = Some(Running {
            addr,
            shutdown,
            task,
        });
        Ok(())
    }

    async fn stop(&mut self) -> AppResult<()> {
        let Running {
            addr,
            shutdown,
            task,
        } = self
            .running
            .take()
            .ok_or(AppError::NotRunning { service: "http" })?;
        let _ = shutdown.send(());
        task.await
            .map_err(|err| AppError::Task {
                service: "http",
                reason: err.to_string(),
            })?
            .map_err(|source| AppError::Http {
                operation: "serve",
                addr,
                source,
            })
    }
}
