//! Live-session lifecycle.

use serde::{Deserialize, Serialize};

/// `scheduled → live → ended`, or `scheduled → cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "live_session_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LiveSessionStatus {
    /// Announced, not started. Seats may be taken early.
    Scheduled,
    /// Broadcasting.
    Live,
    /// Finished.
    Ended,
    /// Called off before it started.
    Cancelled,
}

impl LiveSessionStatus {
    /// Whether the session admits new attendees.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Live)
    }

    /// Capacity edits are only allowed before the session starts.
    pub fn allows_capacity_edit(&self) -> bool {
        matches!(self, Self::Scheduled)
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(&self, next: LiveSessionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::Live)
                | (Self::Live, Self::Ended)
                | (Self::Scheduled, Self::Cancelled)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Ended => "ended",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for LiveSessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joinable_states() {
        assert!(LiveSessionStatus::Scheduled.is_joinable());
        assert!(LiveSessionStatus::Live.is_joinable());
        assert!(!LiveSessionStatus::Ended.is_joinable());
        assert!(!LiveSessionStatus::Cancelled.is_joinable());
    }

    #[test]
    fn test_no_restart_after_end() {
        assert!(!LiveSessionStatus::Ended.can_transition_to(LiveSessionStatus::Live));
        assert!(!LiveSessionStatus::Live.can_transition_to(LiveSessionStatus::Cancelled));
        assert!(LiveSessionStatus::Scheduled.can_transition_to(LiveSessionStatus::Cancelled));
    }
}
