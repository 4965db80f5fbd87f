//! Office-hours repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use learnhub_core::error::{AppError, ErrorKind};
use learnhub_core::result::AppResult;
use learnhub_core::types::{AdmissionOutcome, Capacity};
use learnhub_entity::office_hours::{OfficeHoursSchedule, QueueEntry, QueueEntryStatus};

use super::{count_u32, is_unique_violation};
use crate::admission::{AdmissionScope, ParentState, try_admit};
use crate::store::{NewQueueEntry, OfficeHoursStore};

/// Repository for `office_hours_schedules` and `office_hours_queue`.
#[derive(Debug, Clone)]
pub struct OfficeHoursRepository {
    pool: PgPool,
}

impl OfficeHoursRepository {
    /// Create a new office-hours repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Queue join inside one transaction holding the schedule row lock.
struct QueueJoinScope {
    tx: Transaction<'static, Postgres>,
    entry: NewQueueEntry,
    instructor_id: Option<Uuid>,
}

impl QueueJoinScope {
    fn instructor_id(&self) -> AppResult<Uuid> {
        self.instructor_id
            .ok_or_else(|| AppError::internal("Queue scope used before locking its schedule"))
    }
}

#[async_trait]
impl AdmissionScope for QueueJoinScope {
    type Occupant = QueueEntry;

    async fn lock_parent(&mut self) -> AppResult<Option<ParentState>> {
        let row = sqlx::query_as::<_, (Uuid, bool)>(
            "SELECT instructor_id, is_open FROM office_hours_schedules WHERE id = $1 FOR UPDATE",
        )
        .bind(self.entry.schedule_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock schedule", e))?;

        let Some((instructor_id, is_open)) = row else {
            return Ok(None);
        };

        // One queue per instructor spans all their schedules.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(instructor_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock queue", e))?;

        self.instructor_id = Some(instructor_id);
        Ok(Some(ParentState {
            admitting: is_open,
            capacity: Capacity::Unbounded,
        }))
    }

    async fn find_occupant(&mut self) -> AppResult<Option<QueueEntry>> {
        let instructor_id = self.instructor_id()?;
        sqlx::query_as::<_, QueueEntry>(
            "SELECT * FROM office_hours_queue \
             WHERE instructor_id = $1 AND student_id = $2 AND status IN ('waiting', 'admitted')",
        )
        .bind(instructor_id)
        .bind(self.entry.student_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find queue entry", e))
    }

    async fn count_occupants(&mut self) -> AppResult<u32> {
        let instructor_id = self.instructor_id()?;
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM office_hours_queue \
             WHERE instructor_id = $1 AND status IN ('waiting', 'admitted')",
        )
        .bind(instructor_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count queue", e))?;
        Ok(count_u32(count))
    }

    async fn occupy(&mut self) -> AppResult<QueueEntry> {
        let instructor_id = self.instructor_id()?;
        sqlx::query_as::<_, QueueEntry>(
            "INSERT INTO office_hours_queue \
                (id, schedule_id, instructor_id, student_id, status, question, joined_at) \
             VALUES ($1, $2, $3, $4, 'waiting', $5, clock_timestamp()) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(self.entry.schedule_id)
        .bind(instructor_id)
        .bind(self.entry.student_id)
        .bind(self.entry.question.as_deref())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            // Another schedule of the same instructor won the race.
            if is_unique_violation(&e) {
                AppError::conflict("Student is already in this instructor's queue")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to insert queue entry", e)
            }
        })
    }

    async fn commit(self) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit queue join", e))
    }
}

#[async_trait]
impl OfficeHoursStore for OfficeHoursRepository {
    async fn create_schedule(
        &self,
        schedule: &OfficeHoursSchedule,
    ) -> AppResult<OfficeHoursSchedule> {
        sqlx::query_as::<_, OfficeHoursSchedule>(
            "INSERT INTO office_hours_schedules \
                (id, instructor_id, course_id, title, starts_at, ends_at, is_open, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(schedule.id)
        .bind(schedule.instructor_id)
        .bind(schedule.course_id)
        .bind(&schedule.title)
        .bind(schedule.starts_at)
        .bind(schedule.ends_at)
        .bind(schedule.is_open)
        .bind(schedule.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create schedule", e))
    }

    async fn find_schedule(&self, id: Uuid) -> AppResult<Option<OfficeHoursSchedule>> {
        sqlx::query_as::<_, OfficeHoursSchedule>(
            "SELECT * FROM office_hours_schedules WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find schedule", e))
    }

    async fn set_schedule_open(
        &self,
        id: Uuid,
        is_open: bool,
    ) -> AppResult<Option<OfficeHoursSchedule>> {
        sqlx::query_as::<_, OfficeHoursSchedule>(
            "UPDATE office_hours_schedules SET is_open = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_open)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update schedule", e))
    }

    async fn join(&self, entry: NewQueueEntry) -> AppResult<AdmissionOutcome<QueueEntry>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin queue join", e)
        })?;
        let scope = QueueJoinScope {
            tx,
            entry,
            instructor_id: None,
        };
        try_admit(scope, Capacity::Unbounded).await
    }

    async fn find_entry(&self, id: Uuid) -> AppResult<Option<QueueEntry>> {
        sqlx::query_as::<_, QueueEntry>("SELECT * FROM office_hours_queue WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find queue entry", e)
            })
    }

    async fn transition(
        &self,
        id: Uuid,
        next: QueueEntryStatus,
        actor_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<QueueEntry>> {
        let sources: Vec<&str> = QueueEntryStatus::sources_of(next)
            .iter()
            .map(|s| s.as_str())
            .collect();
        if sources.is_empty() {
            return Ok(None);
        }

        let stamp = |status: QueueEntryStatus| (next == status).then_some(now);
        let cancelled_by = (next == QueueEntryStatus::Cancelled).then_some(actor_id);

        sqlx::query_as::<_, QueueEntry>(
            "UPDATE office_hours_queue SET \
                status = $2, \
                admitted_at = COALESCE($3, admitted_at), \
                completed_at = COALESCE($4, completed_at), \
                cancelled_at = COALESCE($5, cancelled_at), \
                cancelled_by = COALESCE($6, cancelled_by) \
             WHERE id = $1 AND status::text = ANY($7) \
             RETURNING *",
        )
        .bind(id)
        .bind(next)
        .bind(stamp(QueueEntryStatus::Admitted))
        .bind(stamp(QueueEntryStatus::Completed))
        .bind(stamp(QueueEntryStatus::Cancelled))
        .bind(cancelled_by)
        .bind(sources)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update queue entry", e))
    }

    async fn count_waiting_before(
        &self,
        instructor_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> AppResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM office_hours_queue \
             WHERE instructor_id = $1 AND status = 'waiting' AND joined_at < $2",
        )
        .bind(instructor_id)
        .bind(joined_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to compute position", e))?;
        Ok(count_u32(count))
    }

    async fn count_waiting(&self, instructor_id: Uuid) -> AppResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM office_hours_queue WHERE instructor_id = $1 AND status = 'waiting'",
        )
        .bind(instructor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count waiting", e))?;
        Ok(count_u32(count))
    }

    async fn list_active(&self, instructor_id: Uuid) -> AppResult<Vec<QueueEntry>> {
        sqlx::query_as::<_, QueueEntry>(
            "SELECT * FROM office_hours_queue \
             WHERE instructor_id = $1 AND status IN ('waiting', 'admitted') \
             ORDER BY joined_at ASC",
        )
        .bind(instructor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list queue", e))
    }

    async fn list_for_student(&self, student_id: Uuid) -> AppResult<Vec<QueueEntry>> {
        sqlx::query_as::<_, QueueEntry>(
            "SELECT * FROM office_hours_queue \
             WHERE student_id = $1 AND status IN ('waiting', 'admitted') \
             ORDER BY joined_at ASC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list student entries", e)
        })
    }
}
