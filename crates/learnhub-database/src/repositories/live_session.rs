//! Live-session repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use learnhub_core::error::{AppError, ErrorKind};
use learnhub_core::result::AppResult;
use learnhub_core::types::{AdmissionOutcome, Capacity};
use learnhub_entity::live_session::{LiveSession, LiveSessionStatus, SessionMembership};

use super::count_u32;
use crate::admission::{AdmissionScope, ParentState, try_admit};
use crate::store::{CapacityChange, LiveSessionStore, SessionEnd};

/// Whole minutes of the open visit, added to the running total on release.
const CLOSE_VISIT: &str = "left_at = $2, \
    attendance_minutes = attendance_minutes \
        + GREATEST(0, FLOOR(EXTRACT(EPOCH FROM ($2 - joined_at)) / 60))::int";

/// Repository for `live_sessions` and `live_session_members`.
#[derive(Debug, Clone)]
pub struct LiveSessionRepository {
    pool: PgPool,
}

impl LiveSessionRepository {
    /// Create a new live-session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e))
    }
}

async fn count_active(conn: &mut PgConnection, session_id: Uuid) -> AppResult<u32> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM live_session_members WHERE session_id = $1 AND left_at IS NULL",
    )
    .bind(session_id)
    .fetch_one(conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count attendees", e))?;
    Ok(count_u32(count))
}

async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
    tx.commit()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e))
}

/// Seat request inside one transaction holding the session row lock.
struct SeatScope {
    tx: Transaction<'static, Postgres>,
    session_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
}

#[async_trait]
impl AdmissionScope for SeatScope {
    type Occupant = SessionMembership;

    async fn lock_parent(&mut self) -> AppResult<Option<ParentState>> {
        let row = sqlx::query_as::<_, (LiveSessionStatus, i32)>(
            "SELECT status, capacity FROM live_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(self.session_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock session", e))?;

        Ok(row.map(|(status, capacity)| ParentState {
            admitting: status.is_joinable(),
            capacity: Capacity::Limited(u32::try_from(capacity).unwrap_or(0)),
        }))
    }

    async fn find_occupant(&mut self) -> AppResult<Option<SessionMembership>> {
        sqlx::query_as::<_, SessionMembership>(
            "SELECT * FROM live_session_members \
             WHERE session_id = $1 AND user_id = $2 AND left_at IS NULL",
        )
        .bind(self.session_id)
        .bind(self.user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find membership", e))
    }

    async fn count_occupants(&mut self) -> AppResult<u32> {
        count_active(&mut self.tx, self.session_id).await
    }

    async fn occupy(&mut self) -> AppResult<SessionMembership> {
        sqlx::query_as::<_, SessionMembership>(
            "INSERT INTO live_session_members (session_id, user_id, joined_at, left_at, attendance_minutes) \
             VALUES ($1, $2, $3, NULL, 0) \
             ON CONFLICT (session_id, user_id) DO UPDATE SET joined_at = EXCLUDED.joined_at, left_at = NULL \
             RETURNING *",
        )
        .bind(self.session_id)
        .bind(self.user_id)
        .bind(self.now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to take seat", e))
    }

    async fn commit(self) -> AppResult<()> {
        commit(self.tx).await
    }
}

#[async_trait]
impl LiveSessionStore for LiveSessionRepository {
    async fn create(&self, session: &LiveSession) -> AppResult<LiveSession> {
        sqlx::query_as::<_, LiveSession>(
            "INSERT INTO live_sessions \
                (id, owner_id, course_id, title, capacity, status, scheduled_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(session.id)
        .bind(session.owner_id)
        .bind(session.course_id)
        .bind(&session.title)
        .bind(session.capacity)
        .bind(session.status)
        .bind(session.scheduled_at)
        .bind(session.created_at)
        .bind(session.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<LiveSession>> {
        sqlx::query_as::<_, LiveSession>("SELECT * FROM live_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    async fn join(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        capacity: Capacity,
        now: DateTime<Utc>,
    ) -> AppResult<AdmissionOutcome<SessionMembership>> {
        let scope = SeatScope {
            tx: self.begin().await?,
            session_id,
            user_id,
            now,
        };
        try_admit(scope, capacity).await
    }

    async fn leave(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SessionMembership>> {
        let sql = format!(
            "UPDATE live_session_members SET {CLOSE_VISIT} \
             WHERE session_id = $1 AND user_id = $3 AND left_at IS NULL RETURNING *"
        );
        sqlx::query_as::<_, SessionMembership>(&sql)
            .bind(session_id)
            .bind(now)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to leave session", e))
    }

    async fn transition(
        &self,
        id: Uuid,
        from: LiveSessionStatus,
        next: LiveSessionStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LiveSession>> {
        if !from.can_transition_to(next) {
            return Ok(None);
        }
        let started_at = (next == LiveSessionStatus::Live).then_some(now);
        let ended_at = matches!(next, LiveSessionStatus::Ended | LiveSessionStatus::Cancelled)
            .then_some(now);

        sqlx::query_as::<_, LiveSession>(
            "UPDATE live_sessions SET status = $3, \
                started_at = COALESCE($4, started_at), \
                ended_at = COALESCE($5, ended_at), \
                updated_at = $6 \
             WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(id)
        .bind(from)
        .bind(next)
        .bind(started_at)
        .bind(ended_at)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update session", e))
    }

    async fn end(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<SessionEnd>> {
        let mut tx = self.begin().await?;

        let session = sqlx::query_as::<_, LiveSession>(
            "UPDATE live_sessions SET status = 'ended', ended_at = $2, updated_at = $2 \
             WHERE id = $1 AND status = 'live' RETURNING *",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to end session", e))?;

        let Some(session) = session else {
            return Ok(None);
        };

        let sql = format!(
            "UPDATE live_session_members SET {CLOSE_VISIT} \
             WHERE session_id = $1 AND left_at IS NULL RETURNING *"
        );
        let released = sqlx::query_as::<_, SessionMembership>(&sql)
            .bind(id)
            .bind(now)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to release seats", e))?;

        commit(tx).await?;
        Ok(Some(SessionEnd { session, released }))
    }

    async fn update_capacity(
        &self,
        id: Uuid,
        capacity: u32,
        now: DateTime<Utc>,
    ) -> AppResult<CapacityChange> {
        let mut tx = self.begin().await?;

        let status = sqlx::query_scalar::<_, LiveSessionStatus>(
            "SELECT status FROM live_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock session", e))?;

        let Some(status) = status else {
            return Ok(CapacityChange::NotFound);
        };
        if !status.allows_capacity_edit() {
            return Ok(CapacityChange::NotEditable(status));
        }

        let current = count_active(&mut tx, id).await?;
        if capacity < current {
            return Ok(CapacityChange::BelowOccupancy { current });
        }

        let capacity = i32::try_from(capacity)
            .map_err(|_| AppError::validation("Capacity is out of range"))?;
        let session = sqlx::query_as::<_, LiveSession>(
            "UPDATE live_sessions SET capacity = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(capacity)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update capacity", e))?;

        commit(tx).await?;
        Ok(CapacityChange::Updated(session))
    }

    async fn list_attendees(&self, session_id: Uuid) -> AppResult<Vec<SessionMembership>> {
        sqlx::query_as::<_, SessionMembership>(
            "SELECT * FROM live_session_members \
             WHERE session_id = $1 AND left_at IS NULL ORDER BY joined_at ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list attendees", e))
    }

    async fn count_attendees(&self, session_id: Uuid) -> AppResult<u32> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })?;
        count_active(&mut conn, session_id).await
    }
}
