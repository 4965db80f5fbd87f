//! Sweep executor: dispatches sweeps to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use learnhub_core::error::AppError;

/// Trait for sweep implementations
#[async_trait]
pub trait SweepHandler: Send + Sync + std::fmt::Debug {
    /// Name the sweep is registered and triggered under
    fn name(&self) -> &str;

    /// Run one pass as of `now`, returning a summary
    async fn run(&self, now: DateTime<Utc>) -> Result<Value, SweepError>;
}

/// Error from a sweep run
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// Storage was unavailable; the next scheduled run will try again
    #[error("Transient sweep failure: {0}")]
    Transient(String),

    /// No handler under that name
    #[error("Unknown sweep '{0}'")]
    Unknown(String),

    /// A run of the same sweep is still in progress
    #[error("Sweep '{0}' is already running")]
    AlreadyRunning(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl SweepError {
    /// Classifies a service error: transient store failures are not retried here.
    pub fn from_service(e: AppError) -> Self {
        if e.is_transient() {
            Self::Transient(e.to_string())
        } else {
            Self::Internal(e)
        }
    }
}

/// Record of one completed sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepRun {
    /// Sweep name
    pub name: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Handler summary
    pub result: Value,
}

#[derive(Debug)]
struct Registered {
    handler: Arc<dyn SweepHandler>,
    running: Mutex<()>,
}

/// Dispatches sweeps to the appropriate handler by name
#[derive(Debug, Default)]
pub struct SweepExecutor {
    /// Registered handlers by name
    handlers: HashMap<String, Registered>,
}

impl SweepExecutor {
    /// Create a new sweep executor
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sweep handler
    pub fn register(&mut self, handler: Arc<dyn SweepHandler>) {
        let name = handler.name().to_string();
        tracing::info!(sweep = %name, "Registered sweep handler");
        self.handlers.insert(
            name,
            Registered {
                handler,
                running: Mutex::new(()),
            },
        );
    }

    /// Run a sweep now.
    ///
    /// A cron tick and a manual trigger may race; the second caller gets
    /// `AlreadyRunning` instead of a concurrent pass.
    pub async fn run(&self, name: &str) -> Result<SweepRun, SweepError> {
        let registered = self
            .handlers
            .get(name)
            .ok_or_else(|| SweepError::Unknown(name.to_string()))?;
        let _running = registered
            .running
            .try_lock()
            .map_err(|_| SweepError::AlreadyRunning(name.to_string()))?;

        let started_at = Utc::now();
        tracing::debug!(sweep = name, "Running sweep");
        let result = registered.handler.run(started_at).await?;
        let finished_at = Utc::now();
        tracing::info!(
            sweep = name,
            duration_ms = (finished_at - started_at).num_milliseconds(),
            result = %result,
            "Sweep finished"
        );

        Ok(SweepRun {
            name: name.to_string(),
            started_at,
            finished_at,
            result,
        })
    }

    /// Check if a handler is registered under a name
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Get the list of registered sweep names, sorted
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug)]
    struct SlowSweep;

    #[async_trait]
    impl SweepHandler for SlowSweep {
        fn name(&self) -> &str {
            "slow"
        }

        async fn run(&self, _now: DateTime<Utc>) -> Result<Value, SweepError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(serde_json::json!({ "task": "slow" }))
        }
    }

    #[tokio::test]
    async fn test_unknown_sweep_is_rejected() {
        let executor = SweepExecutor::new();
        let err = executor.run("vacuum").await.unwrap_err();
        assert!(matches!(err, SweepError::Unknown(ref name) if name == "vacuum"));
    }

    #[tokio::test]
    async fn test_overlapping_runs_are_refused() {
        let mut executor = SweepExecutor::new();
        executor.register(Arc::new(SlowSweep));
        let executor = Arc::new(executor);

        let first = tokio::spawn({
            let executor = executor.clone();
            async move { executor.run("slow").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = executor.run("slow").await;

        assert!(matches!(second, Err(SweepError::AlreadyRunning(_))));
        let run = first.await.unwrap().unwrap();
        assert_eq!(run.result["task"], "slow");
        assert!(executor.run("slow").await.is_ok());
    }

    #[test]
    fn test_transient_service_errors_are_classified() {
        assert!(matches!(
            SweepError::from_service(AppError::database("down")),
            SweepError::Transient(_)
        ));
        assert!(matches!(
            SweepError::from_service(AppError::internal("bug")),
            SweepError::Internal(_)
        ));
    }
}
