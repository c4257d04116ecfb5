//! Startup banner and shutdown notice.

use async_trait::async_trait;
use scalpel_telemetry::Logger;

use crate::error::AppResult;
use crate::info::AppInfo;
use crate::lifecycle::Service;

/// Logs the application info on start and a shutdown notice on stop.
#[derive(Debug, Clone)]
pub struct InfoBanner {
    logger: Logger,
    info: AppInfo,
}

impl InfoBanner {
    /// Banner for `info`, written through `logger`.
    #[must_use]
    pub const fn new(logger: Logger, info: AppInfo) -> Self {
        Self { logger, info }
    }
}

#[async_trait]
impl Service for InfoBanner {
    fn name(&self) -> &'static str {
        "info-banner"
    }

    async fn start(&mut self) -> AppResult<()> {
        self.logger.info("Starting application:");
        for line in self.info.lines() {
            self.logger.info(line);
        }
        Ok(())
    }

    async fn stop(&mut self) -> AppResult<()> {
        self.logger
            .info("Shutting down gracefully, press Ctrl+C again to force");
        Ok(())
    }
}
