//! Notification queue sweep: promotes items deferred by quiet hours.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use learnhub_service::NotificationFanout;

use crate::executor::{SweepError, SweepHandler};

/// Registered name of the notification queue sweep.
pub const NOTIFICATION_QUEUE_SWEEP: &str = "notification_queue";

/// Runs [`NotificationFanout::sweep_queue`].
#[derive(Debug)]
pub struct NotificationQueueSweepHandler {
    fanout: Arc<NotificationFanout>,
}

impl NotificationQueueSweepHandler {
    /// Create a new notification queue sweep handler
    pub fn new(fanout: Arc<NotificationFanout>) -> Self {
        Self { fanout }
    }
}

#[async_trait]
impl SweepHandler for NotificationQueueSweepHandler {
    fn name(&self) -> &str {
        NOTIFICATION_QUEUE_SWEEP
    }

    async fn run(&self, now: DateTime<Utc>) -> Result<Value, SweepError> {
        let report = self
            .fanout
            .sweep_queue(now)
            .await
            .map_err(SweepError::from_service)?;

        Ok(serde_json::json!({
            "task": NOTIFICATION_QUEUE_SWEEP,
            "promoted": report.promoted,
            "rescheduled": report.rescheduled,
            "discarded": report.discarded,
        }))
    }
}
