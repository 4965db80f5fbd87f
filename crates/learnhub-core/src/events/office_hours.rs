//! Office-hours queue domain events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to the queue, as seen by the instructor's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueChange {
    /// A student joined.
    Joined,
    /// A waiting student was admitted.
    Admitted,
    /// An admitted student was completed.
    Completed,
    /// An entry was cancelled.
    Cancelled,
}

/// Events related to office-hours queues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OfficeHoursEvent {
    /// Room-scoped: the instructor's queue changed.
    QueueUpdated {
        /// Queue owner.
        instructor_id: Uuid,
        /// Entry that moved.
        entry_id: Uuid,
        /// Student on the entry.
        student_id: Uuid,
        /// The transition.
        change: QueueChange,
        /// Waiting entries after the change.
        waiting_count: u32,
    },
    /// Targeted: the student was admitted.
    Admitted {
        /// Entry ID.
        entry_id: Uuid,
        /// Queue owner.
        instructor_id: Uuid,
        /// Student.
        student_id: Uuid,
    },
    /// Targeted: the student's entry was completed.
    Completed {
        /// Entry ID.
        entry_id: Uuid,
        /// Queue owner.
        instructor_id: Uuid,
        /// Student.
        student_id: Uuid,
    },
    /// Targeted: the student's entry was cancelled.
    Cancelled {
        /// Entry ID.
        entry_id: Uuid,
        /// Queue owner.
        instructor_id: Uuid,
        /// Student.
        student_id: Uuid,
        /// Who cancelled.
        cancelled_by: Uuid,
    },
    /// Targeted: an entry ahead left the waiting line.
    PositionChanged {
        /// Entry ID.
        entry_id: Uuid,
        /// Queue owner.
        instructor_id: Uuid,
        /// Student.
        student_id: Uuid,
        /// New 1-based position.
        position: u32,
    },
}

impl OfficeHoursEvent {
    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::QueueUpdated { .. } => "queue_updated",
            Self::Admitted { .. } => "office_hours_admitted",
            Self::Completed { .. } => "office_hours_completed",
            Self::Cancelled { .. } => "office_hours_cancelled",
            Self::PositionChanged { .. } => "queue_position_changed",
        }
    }
}
