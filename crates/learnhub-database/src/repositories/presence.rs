//! Presence repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use learnhub_core::error::{AppError, ErrorKind};
use learnhub_core::result::AppResult;
use learnhub_entity::presence::{PresenceRecord, PresenceStatus};

use crate::store::{PresenceStore, PresenceTransition};

/// A written record plus the status it replaced.
#[derive(Debug, FromRow)]
struct TransitionRow {
    #[sqlx(flatten)]
    record: PresenceRecord,
    previous_status: Option<PresenceStatus>,
}

impl From<TransitionRow> for PresenceTransition {
    fn from(row: TransitionRow) -> Self {
        Self {
            record: row.record,
            previous: row.previous_status,
        }
    }
}

/// Repository for `user_presence`.
#[derive(Debug, Clone)]
pub struct PresenceRepository {
    pool: PgPool,
}

impl PresenceRepository {
    /// Create a new presence repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PresenceStore for PresenceRepository {
    async fn find(&self, user_id: Uuid) -> AppResult<Option<PresenceRecord>> {
        sqlx::query_as::<_, PresenceRecord>("SELECT * FROM user_presence WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find presence", e))
    }

    async fn find_many(&self, user_ids: &[Uuid]) -> AppResult<Vec<PresenceRecord>> {
        sqlx::query_as::<_, PresenceRecord>("SELECT * FROM user_presence WHERE user_id = ANY($1)")
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load presence batch", e)
            })
    }

    async fn list_online(&self, limit: u32) -> AppResult<Vec<PresenceRecord>> {
        sqlx::query_as::<_, PresenceRecord>(
            "SELECT * FROM user_presence WHERE status <> 'offline' \
             ORDER BY last_seen_at DESC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list online users", e))
    }

    async fn upsert_status(
        &self,
        user_id: Uuid,
        status: PresenceStatus,
        activity: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<PresenceTransition> {
        sqlx::query_as::<_, TransitionRow>(
            "WITH prev AS (SELECT status FROM user_presence WHERE user_id = $1 FOR UPDATE) \
             INSERT INTO user_presence (user_id, status, activity, last_seen_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) \
             ON CONFLICT (user_id) DO UPDATE SET \
                status = EXCLUDED.status, \
                activity = EXCLUDED.activity, \
                last_seen_at = EXCLUDED.last_seen_at, \
                updated_at = EXCLUDED.updated_at \
             RETURNING user_presence.*, (SELECT status FROM prev) AS previous_status",
        )
        .bind(user_id)
        .bind(status)
        .bind(activity)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map(PresenceTransition::from)
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update presence", e))
    }

    async fn touch(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<PresenceRecord> {
        sqlx::query_as::<_, PresenceRecord>(
            "INSERT INTO user_presence (user_id, status, activity, last_seen_at, updated_at) \
             VALUES ($1, 'offline', NULL, $2, $2) \
             ON CONFLICT (user_id) DO UPDATE SET last_seen_at = $2, updated_at = $2 \
             RETURNING *",
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record heartbeat", e))
    }

    async fn demote_stale(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PresenceTransition>> {
        // Rows are locked and re-checked by the CTE, so a heartbeat that
        // commits first keeps its record online.
        let rows = sqlx::query_as::<_, TransitionRow>(
            "WITH stale AS ( \
                SELECT user_id, status FROM user_presence \
                WHERE status <> 'offline' AND updated_at < $1 \
                FOR UPDATE SKIP LOCKED \
             ) \
             UPDATE user_presence p SET status = 'offline', updated_at = $2 \
             FROM stale \
             WHERE p.user_id = stale.user_id AND p.updated_at < $1 \
             RETURNING p.user_id, p.status, p.activity, p.last_seen_at, p.updated_at, \
                       stale.status AS previous_status",
        )
        .bind(cutoff)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to demote stale presence", e)
        })?;

        Ok(rows.into_iter().map(PresenceTransition::from).collect())
    }
}
