//! Presence liveness sweep: demotes users whose heartbeats stopped.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use learnhub_service::PresenceService;

use crate::executor::{SweepError, SweepHandler};

/// Registered name of the presence sweep.
pub const PRESENCE_SWEEP: &str = "presence";

/// Runs [`PresenceService::sweep_stale`].
#[derive(Debug)]
pub struct PresenceSweepHandler {
    /// Presence service (owns the threshold and the broadcasts)
    presence: Arc<PresenceService>,
}

impl PresenceSweepHandler {
    /// Create a new presence sweep handler
    pub fn new(presence: Arc<PresenceService>) -> Self {
        Self { presence }
    }
}

#[async_trait]
impl SweepHandler for PresenceSweepHandler {
    fn name(&self) -> &str {
        PRESENCE_SWEEP
    }

    async fn run(&self, now: DateTime<Utc>) -> Result<Value, SweepError> {
        let cutoff = self.presence.stale_cutoff(now);
        let demoted = self
            .presence
            .sweep_stale(now)
            .await
            .map_err(SweepError::from_service)?;

        if demoted > 0 {
            tracing::info!(demoted, cutoff = %cutoff, "Presence sweep demoted stale users");
        }

        Ok(serde_json::json!({
            "task": PRESENCE_SWEEP,
            "demoted": demoted,
            "cutoff": cutoff,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use learnhub_core::config::PresenceConfig;
    use learnhub_core::traits::NullPublisher;
    use learnhub_database::memory::MemoryPresenceStore;
    use learnhub_entity::presence::PresenceStatus;
    use learnhub_service::EventSink;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_sweep_demotes_silent_users_only() {
        let presence = Arc::new(PresenceService::new(
            Arc::new(MemoryPresenceStore::new()),
            EventSink::new(Arc::new(NullPublisher)),
            PresenceConfig::default(),
        ));
        let silent = Uuid::new_v4();
        presence
            .set_status(silent, PresenceStatus::Online, None)
            .await
            .unwrap();

        let handler = PresenceSweepHandler::new(presence.clone());
        let soon = handler.run(Utc::now() + Duration::seconds(60)).await.unwrap();
        assert_eq!(soon["demoted"], 0);

        let later = handler.run(Utc::now() + Duration::seconds(301)).await.unwrap();
        assert_eq!(later["demoted"], 1);
        assert_eq!(
            presence.get_status(silent).await.unwrap().status,
            PresenceStatus::Offline
        );
    }
}
