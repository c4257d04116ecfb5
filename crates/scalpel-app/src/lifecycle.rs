//! Ordered service start/stop.
//!
//! # Design
//! - Services start in registration order and stop in reverse.
//! - A failed start rolls back the services that already started before the error is
//!   returned.
//! - `stop` always finishes by draining the logger, so the last records reach disk.

use std::future::Future;

use async_trait::async_trait;
use scalpel_telemetry::Logger;
use tracing::{info, warn};

use crate::error::AppResult;

/// A component with an explicit start/stop lifecycle.
#[async_trait]
pub trait Service: Send {
    /// Short name used in lifecycle logs.
    fn name(&self) -> &'static str;

    /// Bring the service up.
    async fn start(&mut self) -> AppResult<()>;

    /// Tear the service down.
    async fn stop(&mut self) -> AppResult<()>;
}

/// Runs registered services as one unit.
pub struct Runner {
    logger: Logger,
    services: Vec<Box<dyn Service>>,
    started: usize,
}

impl Runner {
    /// Empty runner that shuts `logger` down on stop.
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            services: Vec::new(),
            started: 0,
        }
    }

    /// Register a service; start order follows registration order.
    #[must_use]
    pub fn with_service(mut self, service: impl Service + 'static) -> Self {
        self.services.push(Box::new(service));
        self
    }

    /// Start every service in order.
    ///
    /// # Errors
    ///
    /// Returns the first start failure after stopping the services that had started.
    pub async fn start(&mut self) -> AppResult<()> {
        while self.started < self.services.len() {
            let service = &mut self.services[self.started];
            let name = service.name();
            if let Err(err) = service.start().await {
                warn!(service = name, error = %err, "service failed to start, rolling back");
                if let Err(stop_err) = self.stop().await {
                    warn!(error = %stop_err, "rollback stop failed");
                }
                return Err(err);
            }
            info!(service = name, "service started");
            self.started += 1;
        }
        Ok(())
    }

    /// Stop started services in reverse order and shut the logger down.
    ///
    /// Every started service is asked to stop even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first stop failure.
    pub async fn stop(&mut self) -> AppResult<()> {
        let mut first_error = None;
        while self.started > 0 {
            self.started -= 1;
            let service = &mut self.services[self.started];
            let name = service.name();
            match service.stop().await {
                Ok(()) => info!(service = name, "service stopped"),
                Err(err) => {
                    warn!(service = name, error = %err, "service failed to stop");
                    first_error.get_or_insert(err);
                }
            }
        }
        self.logger.shutdown();
        first_error.map_or(Ok(()), Err)
    }

    /// Start, wait for `signal`, then stop.
    ///
    /// # Errors
    ///
    /// Returns a start failure, the signal's error, or the first stop failure, in that
    /// order of precedence.
    pub async fn run_until<F>(mut self, signal: F) -> AppResult<()>
    where
        F: Future<Output = AppResult<()>> + Send,
    {
        self.start().await?;
        let outcome = signal.await;
        let stopped = self.stop().await;
        outcome.and(stopped)
    }
}
