//! Live-session row models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::LiveSessionStatus;

/// A capacity-limited broadcast session owned by an instructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LiveSession {
    /// Session ID.
    pub id: Uuid,
    /// Capacity owner.
    pub owner_id: Uuid,
    /// Course the session belongs to, if any.
    pub course_id: Option<Uuid>,
    /// Display title.
    pub title: String,
    /// Maximum simultaneous attendees. Always positive.
    pub capacity: i32,
    /// Lifecycle status.
    pub status: LiveSessionStatus,
    /// Planned start.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Actual start.
    pub started_at: Option<DateTime<Utc>>,
    /// Actual end.
    pub ended_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl LiveSession {
    /// Capacity as an unsigned seat count.
    pub fn seats(&self) -> u32 {
        u32::try_from(self.capacity).unwrap_or(0)
    }
}

/// A user's seat in a live session. One row per (session, user); re-joins
/// reuse it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SessionMembership {
    /// Session ID.
    pub session_id: Uuid,
    /// Attendee.
    pub user_id: Uuid,
    /// Start of the current (or last) visit.
    pub joined_at: DateTime<Utc>,
    /// `None` while the seat is held.
    pub left_at: Option<DateTime<Utc>>,
    /// Minutes attended over all completed visits.
    pub attendance_minutes: i32,
}

impl SessionMembership {
    /// Whether the member currently holds a seat.
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }

    /// Close the current visit at `now`, adding its whole minutes to the total.
    pub fn close_visit(&mut self, now: DateTime<Utc>) {
        if self.left_at.is_some() {
            return;
        }
        self.attendance_minutes += visit_minutes(self.joined_at, now);
        self.left_at = Some(now);
    }

    /// Reopen the seat for a new visit starting at `now`.
    pub fn reopen(&mut self, now: DateTime<Utc>) {
        self.joined_at = now;
        self.left_at = None;
    }
}

/// Whole minutes between `joined_at` and `now`, never negative.
pub fn visit_minutes(joined_at: DateTime<Utc>, now: DateTime<Utc>) -> i32 {
    let minutes = (now - joined_at).num_minutes().max(0);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}
