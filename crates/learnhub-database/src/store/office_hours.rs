//! Office-hours persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_core::types::AdmissionOutcome;
use learnhub_entity::office_hours::{OfficeHoursSchedule, QueueEntry, QueueEntryStatus};

/// A student's request to join through a schedule.
///
/// The store stamps `joined_at` once it holds the queue lock, so FIFO order
/// matches commit order.
#[derive(Debug, Clone)]
pub struct NewQueueEntry {
    /// Schedule joined through; its row is the lock target.
    pub schedule_id: Uuid,
    /// Student joining.
    pub student_id: Uuid,
    /// Optional question.
    pub question: Option<String>,
}

/// Schedules and queue entries.
#[async_trait]
pub trait OfficeHoursStore: Send + Sync + std::fmt::Debug {
    /// Persist a new schedule.
    async fn create_schedule(&self, schedule: &OfficeHoursSchedule)
    -> AppResult<OfficeHoursSchedule>;

    /// Load a schedule.
    async fn find_schedule(&self, id: Uuid) -> AppResult<Option<OfficeHoursSchedule>>;

    /// Open or close a schedule for joins.
    async fn set_schedule_open(
        &self,
        id: Uuid,
        is_open: bool,
    ) -> AppResult<Option<OfficeHoursSchedule>>;

    /// Admit a student into the schedule's instructor queue.
    ///
    /// The queue is unbounded. An existing waiting or admitted entry of the
    /// same student with the same instructor comes back as
    /// `already_present` instead of a second row.
    async fn join(&self, entry: NewQueueEntry) -> AppResult<AdmissionOutcome<QueueEntry>>;

    /// Load an entry.
    async fn find_entry(&self, id: Uuid) -> AppResult<Option<QueueEntry>>;

    /// Move an entry to `next` if its current status allows it.
    ///
    /// Returns `None` when the entry is missing or the transition is not
    /// legal from the status it has at write time.
    async fn transition(
        &self,
        id: Uuid,
        next: QueueEntryStatus,
        actor_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<QueueEntry>>;

    /// Waiting entries of `instructor_id` that joined strictly before `joined_at`.
    async fn count_waiting_before(
        &self,
        instructor_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> AppResult<u32>;

    /// Waiting entries of `instructor_id`.
    async fn count_waiting(&self, instructor_id: Uuid) -> AppResult<u32>;

    /// Waiting and admitted entries of `instructor_id` in join order.
    async fn list_active(&self, instructor_id: Uuid) -> AppResult<Vec<QueueEntry>>;

    /// Waiting and admitted entries of `student_id` across instructors.
    async fn list_for_student(&self, student_id: Uuid) -> AppResult<Vec<QueueEntry>>;
}
