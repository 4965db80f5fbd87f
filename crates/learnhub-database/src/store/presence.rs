//! Presence persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_entity::presence::{PresenceRecord, PresenceStatus};

/// A record after a write, with the status it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceTransition {
    /// The record as stored.
    pub record: PresenceRecord,
    /// Status before the write; `None` if the record was just created.
    pub previous: Option<PresenceStatus>,
}

impl PresenceTransition {
    /// Whether the write changed the visible status.
    pub fn status_changed(&self) -> bool {
        self.previous != Some(self.record.status)
    }
}

/// Per-user liveness records. At most one per user, never hard-deleted.
#[async_trait]
pub trait PresenceStore: Send + Sync + std::fmt::Debug {
    /// Load one user's record.
    async fn find(&self, user_id: Uuid) -> AppResult<Option<PresenceRecord>>;

    /// Load the records that exist among `user_ids`.
    async fn find_many(&self, user_ids: &[Uuid]) -> AppResult<Vec<PresenceRecord>>;

    /// Records whose status is not offline, most recently seen first.
    async fn list_online(&self, limit: u32) -> AppResult<Vec<PresenceRecord>>;

    /// Upsert status and activity, stamping both timestamps with `now`.
    async fn upsert_status(
        &self,
        user_id: Uuid,
        status: PresenceStatus,
        activity: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<PresenceTransition>;

    /// Stamp both timestamps with `now` without touching the status.
    ///
    /// A user with no record gets an offline one.
    async fn touch(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<PresenceRecord>;

    /// Demote every non-offline record last updated before `cutoff`.
    ///
    /// Each row is re-checked as it is updated, so a record refreshed after
    /// the scan began is left alone.
    async fn demote_stale(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PresenceTransition>>;
}
