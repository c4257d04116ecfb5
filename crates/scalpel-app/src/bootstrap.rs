//! Application boot sequence.
//!
//! # Design
//! - Dependencies are resolved up front (configuration, logger, info, metrics) so the
//!   run phase only deals with already-validated inputs.
//! - The logger is installed as the global `tracing` subscriber so lifecycle and
//!   framework events reach the same sinks.
//! - Services run until Ctrl+C; the runner drains the logger on the way out.

use scalpel_config::Validated;
use scalpel_telemetry::{Logger, Metrics, build_logger, install_global};
use tracing::info;

use crate::banner::InfoBanner;
use crate::config::{APP_NAME, AppConfig, ConfigSources, load_config};
use crate::error::{AppError, AppResult};
use crate::http::{HttpService, router};
use crate::info::AppInfo;
use crate::lifecycle::Runner;

/// Dependencies required to run the application.
pub(crate) struct BootstrapDependencies {
    config: Validated<AppConfig>,
    logger: Logger,
    info: AppInfo,
    metrics: Metrics,
}

impl BootstrapDependencies {
    /// Resolve dependencies from explicit configuration sources.
    pub(crate) fn from_sources(sources: ConfigSources) -> AppResult<Self> {
        let config = load_config(sources)?;
        let logger = build_logger(&config.part(|config| &config.logs))
            .map_err(|err| AppError::telemetry("build_logger", err))?;
        let info = AppInfo::gather(APP_NAME)?;
        let metrics = Metrics::new().map_err(|err| AppError::telemetry("metrics.new", err))?;
        Ok(Self {
            config,
            logger,
            info,
            metrics,
        })
    }

    /// Assemble the runner: banner first, then the HTTP listener.
    pub(crate) fn into_runner(self) -> Runner {
        let addr = self.config.http.socket_addr();
        let routes = router(self.info.clone(), self.metrics, self.logger.clone());
        Runner::new(self.logger.clone())
            .with_service(InfoBanner::new(self.logger, self.info))
            .with_service(HttpService::new(addr, routes))
    }
}

/// Entry point for the application boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, logger construction, or any service fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_sources(ConfigSources::from_env())?;
    install_global(&dependencies.logger)
        .map_err(|err| AppError::telemetry("install_global", err))?;
    info!("application bootstrap starting");
    dependencies.into_runner().run_until(shutdown_signal()).await
}

async fn shutdown_signal() -> AppResult<()> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|source| AppError::Signal { source })
}
