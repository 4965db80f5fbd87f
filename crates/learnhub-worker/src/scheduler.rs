//! Cron scheduler that triggers the sweeps periodically.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use learnhub_core::config::{NotificationConfig, PresenceConfig};
use learnhub_core::error::AppError;

use crate::executor::{SweepError, SweepExecutor};
use crate::jobs::{NOTIFICATION_QUEUE_SWEEP, PRESENCE_SWEEP};

/// Cron-based scheduler for the periodic sweeps
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Executor shared with the manual trigger endpoint
    executor: Arc<SweepExecutor>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(executor: Arc<SweepExecutor>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            executor,
        })
    }

    /// Register both sweeps on their configured schedules
    pub async fn register_default_tasks(
        &self,
        presence: &PresenceConfig,
        notifications: &NotificationConfig,
    ) -> Result<(), AppError> {
        self.register(PRESENCE_SWEEP, &presence.sweep_cron).await?;
        self.register(NOTIFICATION_QUEUE_SWEEP, &notifications.sweep_cron)
            .await?;

        tracing::info!("All scheduled sweeps registered");
        Ok(())
    }

    /// Run the named sweep on a cron schedule (six fields, seconds first)
    pub async fn register(&self, name: &'static str, cron: &str) -> Result<(), AppError> {
        if !self.executor.has_handler(name) {
            return Err(AppError::configuration(format!(
                "No sweep handler registered for '{name}'"
            )));
        }

        let executor = Arc::clone(&self.executor);
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            Box::pin(async move {
                match executor.run(name).await {
                    Ok(_) => {}
                    Err(SweepError::AlreadyRunning(_)) => {
                        tracing::debug!(sweep = name, "Previous run still in progress, skipping tick");
                    }
                    Err(e) => {
                        tracing::error!(sweep = name, error = %e, "Scheduled sweep failed");
                    }
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid schedule '{cron}' for {name}: {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {name} schedule: {e}")))?;

        tracing::info!(sweep = name, cron = %cron, "Registered scheduled sweep");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
