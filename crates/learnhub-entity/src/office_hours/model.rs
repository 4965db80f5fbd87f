//! Office-hours row models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::QueueEntryStatus;

/// An instructor's office-hours block. Its row is the lock target for joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OfficeHoursSchedule {
    /// Schedule ID.
    pub id: Uuid,
    /// Queue owner.
    pub instructor_id: Uuid,
    /// Course the block belongs to, if any.
    pub course_id: Option<Uuid>,
    /// Display title.
    pub title: String,
    /// Planned start.
    pub starts_at: Option<DateTime<Utc>>,
    /// Planned end.
    pub ends_at: Option<DateTime<Utc>>,
    /// Whether students may join.
    pub is_open: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// One student's place in an instructor's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct QueueEntry {
    /// Entry ID.
    pub id: Uuid,
    /// Schedule joined through.
    pub schedule_id: Uuid,
    /// Queue owner.
    pub instructor_id: Uuid,
    /// Student in line.
    pub student_id: Uuid,
    /// Lifecycle status.
    pub status: QueueEntryStatus,
    /// What the student wants help with.
    pub question: Option<String>,
    /// FIFO key.
    pub joined_at: DateTime<Utc>,
    /// Set on admission.
    pub admitted_at: Option<DateTime<Utc>>,
    /// Set on completion.
    pub completed_at: Option<DateTime<Utc>>,
    /// Set on cancellation.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Who cancelled.
    pub cancelled_by: Option<Uuid>,
}

impl QueueEntry {
    /// Whether `user_id` is the student or the instructor on this entry.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.student_id == user_id || self.instructor_id == user_id
    }

    /// Move the entry to `next`, stamping the matching timestamp.
    ///
    /// Returns `false` and leaves the entry untouched if the transition is
    /// illegal.
    pub fn apply_transition(
        &mut self,
        next: QueueEntryStatus,
        actor_id: Uuid,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        match next {
            QueueEntryStatus::Admitted => self.admitted_at = Some(now),
            QueueEntryStatus::Completed => self.completed_at = Some(now),
            QueueEntryStatus::Cancelled => {
                self.cancelled_at = Some(now);
                self.cancelled_by = Some(actor_id);
            }
            QueueEntryStatus::Waiting => {}
        }
        true
    }
}
