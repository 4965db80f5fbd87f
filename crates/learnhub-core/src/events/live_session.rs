//! Live-session domain events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to live-session membership and lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveSessionEvent {
    /// A user took a seat.
    AttendeeJoined {
        /// Session ID.
        session_id: Uuid,
        /// Joining user.
        user_id: Uuid,
        /// Occupied seats after the join.
        current_count: u32,
        /// Session capacity.
        capacity: u32,
    },
    /// A user gave up their seat.
    AttendeeLeft {
        /// Session ID.
        session_id: Uuid,
        /// Leaving user.
        user_id: Uuid,
        /// Accumulated minutes attended.
        attendance_minutes: i32,
    },
    /// The owner started the session.
    Started {
        /// Session ID.
        session_id: Uuid,
    },
    /// The owner ended the session; every seat was released.
    Ended {
        /// Session ID.
        session_id: Uuid,
        /// Members force-left by the end.
        released: u32,
    },
    /// The session was cancelled before it started.
    Cancelled {
        /// Session ID.
        session_id: Uuid,
    },
    /// The owner changed the capacity.
    CapacityChanged {
        /// Session ID.
        session_id: Uuid,
        /// New capacity.
        capacity: u32,
    },
}

impl LiveSessionEvent {
    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AttendeeJoined { .. } => "attendee_joined",
            Self::AttendeeLeft { .. } => "attendee_left",
            Self::Started { .. } => "session_started",
            Self::Ended { .. } => "session_ended",
            Self::Cancelled { .. } => "session_cancelled",
            Self::CapacityChanged { .. } => "session_capacity_changed",
        }
    }
}
