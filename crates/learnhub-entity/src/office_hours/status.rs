//! Queue entry lifecycle.

use serde::{Deserialize, Serialize};

/// Lifecycle of an office-hours queue entry.
///
/// `waiting → admitted → completed`, and `waiting | admitted → cancelled`.
/// Completed and cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "queue_entry_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QueueEntryStatus {
    /// In line.
    Waiting,
    /// Being helped.
    Admitted,
    /// Helped and done.
    Completed,
    /// Withdrawn by either party.
    Cancelled,
}

impl QueueEntryStatus {
    /// Statuses that count against the one-active-entry-per-pair rule.
    pub const ACTIVE: [QueueEntryStatus; 2] = [Self::Waiting, Self::Admitted];

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(&self, next: QueueEntryStatus) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::Admitted)
                | (Self::Admitted, Self::Completed)
                | (Self::Waiting, Self::Cancelled)
                | (Self::Admitted, Self::Cancelled)
        )
    }

    /// Statuses from which `next` may be reached.
    pub fn sources_of(next: QueueEntryStatus) -> &'static [QueueEntryStatus] {
        match next {
            Self::Admitted => &[Self::Waiting],
            Self::Completed => &[Self::Admitted],
            Self::Cancelled => &[Self::Waiting, Self::Admitted],
            Self::Waiting => &[],
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Admitted => "admitted",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for QueueEntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [QueueEntryStatus; 4] = [
        QueueEntryStatus::Waiting,
        QueueEntryStatus::Admitted,
        QueueEntryStatus::Completed,
        QueueEntryStatus::Cancelled,
    ];

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_sources_agree_with_transitions() {
        for to in ALL {
            for from in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    QueueEntryStatus::sources_of(to).contains(&from),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_completed_requires_admission() {
        assert!(!QueueEntryStatus::Waiting.can_transition_to(QueueEntryStatus::Completed));
    }
}
