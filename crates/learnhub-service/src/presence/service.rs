//! Presence service: status writes, heartbeats, lookups, and the sweep.
//!
//! The store performs the state change; this service decides which changes
//! are broadcast. Heartbeats are never broadcast, so periodic pings from
//! every open tab do not turn into an event storm.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_core::config::PresenceConfig;
use learnhub_core::error::AppError;
use learnhub_core::events::{Audience, EventPayload, PresenceEvent};
use learnhub_database::store::{PresenceStore, PresenceTransition};
use learnhub_entity::presence::{PresenceRecord, PresenceStatus};

use crate::events::EventSink;

/// Longest free-text activity accepted.
const MAX_ACTIVITY_LEN: usize = 200;

/// Tracks who is online and demotes silent users.
#[derive(Debug, Clone)]
pub struct PresenceService {
    /// Presence storage.
    store: Arc<dyn PresenceStore>,
    /// Broadcast sink.
    events: EventSink,
    /// Thresholds and limits.
    config: PresenceConfig,
}

impl PresenceService {
    /// Creates a new presence service.
    pub fn new(store: Arc<dyn PresenceStore>, events: EventSink, config: PresenceConfig) -> Self {
        Self {
            store,
            events,
            config,
        }
    }

    /// Set a user's status and activity, then broadcast the change globally.
    pub async fn set_status(
        &self,
        user_id: Uuid,
        status: PresenceStatus,
        activity: Option<String>,
    ) -> AppResult<PresenceRecord> {
        let activity = normalize_activity(activity)?;
        let transition = self
            .store
            .upsert_status(user_id, status, activity.as_deref(), Utc::now())
            .await?;

        debug!(
            user_id = %user_id,
            status = %status,
            previous = ?transition.previous,
            "Presence status set"
        );
        self.broadcast(&transition, Some(user_id)).await;
        Ok(transition.record)
    }

    /// Refresh liveness without changing status. Not broadcast.
    pub async fn heartbeat(&self, user_id: Uuid) -> AppResult<PresenceRecord> {
        self.store.touch(user_id, Utc::now()).await
    }

    /// Current record for a user; unknown users and unreachable stores read as offline.
    pub async fn get_status(&self, user_id: Uuid) -> AppResult<PresenceRecord> {
        match self.store.find(user_id).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Ok(PresenceRecord::unknown(user_id, Utc::now())),
            Err(e) if e.is_transient() => {
                warn!(user_id = %user_id, error = %e, "Presence lookup failed; reporting offline");
                Ok(PresenceRecord::unknown(user_id, Utc::now()))
            }
            Err(e) => Err(e),
        }
    }

    /// Records for several users, in request order, with missing ones offline.
    pub async fn get_many(&self, user_ids: &[Uuid]) -> AppResult<Vec<PresenceRecord>> {
        if user_ids.len() > self.config.batch_lookup_max {
            return Err(AppError::validation(format!(
                "At most {} users may be looked up at once",
                self.config.batch_lookup_max
            )));
        }

        let now = Utc::now();
        let found: HashMap<Uuid, PresenceRecord> = match self.store.find_many(user_ids).await {
            Ok(records) => records.into_iter().map(|r| (r.user_id, r)).collect(),
            Err(e) if e.is_transient() => {
                warn!(count = user_ids.len(), error = %e, "Batch presence lookup failed; reporting offline");
                HashMap::new()
            }
            Err(e) => return Err(e),
        };

        Ok(user_ids
            .iter()
            .map(|id| {
                found
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| PresenceRecord::unknown(*id, now))
            })
            .collect())
    }

    /// Users whose status is not offline, most recent first.
    pub async fn list_online(&self, limit: Option<u32>) -> AppResult<Vec<PresenceRecord>> {
        let limit = limit
            .unwrap_or(self.config.online_list_limit)
            .clamp(1, self.config.online_list_limit_max);
        self.store.list_online(limit).await
    }

    /// Oldest `updated_at` that still counts as live at `now`.
    pub fn stale_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let secs = i64::try_from(self.config.stale_after_seconds).unwrap_or(i64::MAX);
        now - Duration::seconds(secs)
    }

    /// Demote every record silent for longer than the threshold.
    ///
    /// Returns the number demoted. Safe to run concurrently with live
    /// updates and with itself.
    pub async fn sweep_stale(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let cutoff = self.stale_cutoff(now);
        let demoted = self.store.demote_stale(cutoff, now).await?;

        for transition in &demoted {
            self.broadcast(transition, None).await;
        }
        if !demoted.is_empty() {
            info!(count = demoted.len(), cutoff = %cutoff, "Presence sweep demoted stale users");
        }
        Ok(demoted.len())
    }

    async fn broadcast(&self, transition: &PresenceTransition, actor_id: Option<Uuid>) {
        let record = &transition.record;
        self.events
            .emit(
                Audience::Global,
                actor_id,
                EventPayload::Presence(PresenceEvent::Changed {
                    user_id: record.user_id,
                    status: record.status.as_str().to_string(),
                    previous_status: transition.previous.map(|s| s.as_str().to_string()),
                    activity: record.activity.clone(),
                    updated_at: record.updated_at,
                }),
            )
            .await;
    }
}

fn normalize_activity(activity: Option<String>) -> AppResult<Option<String>> {
    let Some(activity) = activity else {
        return Ok(None);
    };
    let trimmed = activity.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_ACTIVITY_LEN {
        return Err(AppError::validation(format!(
            "Activity must be at most {MAX_ACTIVITY_LEN} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}
