//! In-memory presence store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_entity::presence::{PresenceRecord, PresenceStatus};

use crate::store::{PresenceStore, PresenceTransition};

/// Presence records keyed by user.
#[derive(Debug, Default)]
pub struct MemoryPresenceStore {
    records: DashMap<Uuid, PresenceRecord>,
}

impl MemoryPresenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceStore for MemoryPresenceStore {
    async fn find(&self, user_id: Uuid) -> AppResult<Option<PresenceRecord>> {
        Ok(self.records.get(&user_id).map(|r| r.clone()))
    }

    async fn find_many(&self, user_ids: &[Uuid]) -> AppResult<Vec<PresenceRecord>> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.records.get(id).map(|r| r.clone()))
            .collect())
    }

    async fn list_online(&self, limit: u32) -> AppResult<Vec<PresenceRecord>> {
        let mut online: Vec<PresenceRecord> = self
            .records
            .iter()
            .filter(|r| r.status.is_online())
            .map(|r| r.clone())
            .collect();
        online.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at));
        online.truncate(limit as usize);
        Ok(online)
    }

    async fn upsert_status(
        &self,
        user_id: Uuid,
        status: PresenceStatus,
        activity: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<PresenceTransition> {
        let mut previous = None;
        let mut entry = self
            .records
            .entry(user_id)
            .and_modify(|r| previous = Some(r.status))
            .or_insert_with(|| PresenceRecord::unknown(user_id, now));
        entry.status = status;
        entry.activity = activity.map(str::to_string);
        entry.last_seen_at = now;
        entry.updated_at = now;

        Ok(PresenceTransition {
            record: entry.clone(),
            previous,
        })
    }

    async fn touch(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<PresenceRecord> {
        let mut entry = self
            .records
            .entry(user_id)
            .or_insert_with(|| PresenceRecord::unknown(user_id, now));
        entry.last_seen_at = now;
        entry.updated_at = now;
        Ok(entry.clone())
    }

    async fn demote_stale(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PresenceTransition>> {
        let candidates: Vec<Uuid> = self
            .records
            .iter()
            .filter(|r| r.is_stale(cutoff))
            .map(|r| r.user_id)
            .collect();

        let mut demoted = Vec::with_capacity(candidates.len());
        for user_id in candidates {
            // Re-check under the entry lock: a heartbeat may have landed since the scan.
            if let Some(mut record) = self.records.get_mut(&user_id) {
                if !record.is_stale(cutoff) {
                    continue;
                }
                let previous = record.status;
                record.status = PresenceStatus::Offline;
                record.updated_at = now;
                demoted.push(PresenceTransition {
                    record: record.clone(),
                    previous: Some(previous),
                });
            }
        }
        Ok(demoted)
    }
}
