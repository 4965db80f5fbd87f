//! Value types for capacity admission.
//!
//! An admission decision is taken while the resource's parent record is
//! locked, so the count reported here is the count at decision time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound on concurrent occupants of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "limit", rename_all = "snake_case")]
pub enum Capacity {
    /// At most this many occupants.
    Limited(u32),
    /// No limit; admission only checks existence and admitting state.
    Unbounded,
}

impl Capacity {
    /// Whether one more occupant fits on top of `current`.
    pub fn has_room(&self, current: u32) -> bool {
        match self {
            Capacity::Limited(limit) => current < *limit,
            Capacity::Unbounded => true,
        }
    }

    /// The stricter of two capacities.
    pub fn tightest(self, other: Capacity) -> Capacity {
        match (self, other) {
            (Capacity::Limited(a), Capacity::Limited(b)) => Capacity::Limited(a.min(b)),
            (Capacity::Limited(a), Capacity::Unbounded) => Capacity::Limited(a),
            (Capacity::Unbounded, other) => other,
        }
    }
}

impl From<Option<u32>> for Capacity {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Capacity::Unbounded, Capacity::Limited)
    }
}

/// Why an admission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Every slot is taken.
    AtCapacity,
    /// The parent resource does not exist.
    NotFound,
    /// The parent resource exists but is not accepting occupants.
    NotAdmitting,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::AtCapacity => write!(f, "at capacity"),
            DenialReason::NotFound => write!(f, "not found"),
            DenialReason::NotAdmitting => write!(f, "not admitting"),
        }
    }
}

/// Result of a single admission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome<O> {
    /// The requester holds a slot.
    Admitted {
        /// The occupant record (membership, queue entry, ...).
        occupant: O,
        /// Occupied slots after the decision, including this one.
        current_count: u32,
        /// The requester already held a slot; nothing was counted twice.
        already_present: bool,
    },
    /// The requester was refused.
    Denied {
        /// Why.
        reason: DenialReason,
        /// Occupied slots at decision time.
        current_count: u32,
    },
}

/// The wire shape `{admitted, current_count, reason?}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionSummary {
    /// Whether a slot is held.
    pub admitted: bool,
    /// Occupied slots.
    pub current_count: u32,
    /// Set on denial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
}

impl<O> AdmissionOutcome<O> {
    /// Whether a slot is held.
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionOutcome::Admitted { .. })
    }

    /// Occupied slots reported with the decision.
    pub fn current_count(&self) -> u32 {
        match self {
            AdmissionOutcome::Admitted { current_count, .. }
            | AdmissionOutcome::Denied { current_count, .. } => *current_count,
        }
    }

    /// Denial reason, if any.
    pub fn reason(&self) -> Option<DenialReason> {
        match self {
            AdmissionOutcome::Admitted { .. } => None,
            AdmissionOutcome::Denied { reason, .. } => Some(*reason),
        }
    }

    /// Collapse into the summary shape.
    pub fn summary(&self) -> AdmissionSummary {
        AdmissionSummary {
            admitted: self.is_admitted(),
            current_count: self.current_count(),
            reason: self.reason(),
        }
    }

    /// Map the occupant.
    pub fn map<P>(self, f: impl FnOnce(O) -> P) -> AdmissionOutcome<P> {
        match self {
            AdmissionOutcome::Admitted {
                occupant,
                current_count,
                already_present,
            } => AdmissionOutcome::Admitted {
                occupant: f(occupant),
                current_count,
                already_present,
            },
            AdmissionOutcome::Denied {
                reason,
                current_count,
            } => AdmissionOutcome::Denied {
                reason,
                current_count,
            },
        }
    }
}

impl DenialReason {
    /// The error a caller surfaces for this denial.
    ///
    /// Not-admitting maps to not-found: the resource is in the wrong
    /// lifecycle state for the operation.
    pub fn into_error(self, resource: &str) -> AppError {
        match self {
            DenialReason::AtCapacity => {
                AppError::capacity_exceeded(format!("{resource} is at capacity"))
            }
            DenialReason::NotFound => AppError::not_found(format!("{resource} not found")),
            DenialReason::NotAdmitting => {
                AppError::not_found(format!("{resource} is not accepting participants"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_limited_capacity_has_room() {
        let cap = Capacity::Limited(2);
        assert!(cap.has_room(0));
        assert!(cap.has_room(1));
        assert!(!cap.has_room(2));
        assert!(!cap.has_room(3));
    }

    #[test]
    fn test_unbounded_always_has_room() {
        assert!(Capacity::Unbounded.has_room(u32::MAX));
    }

    #[test]
    fn test_tightest_picks_stricter_limit() {
        assert_eq!(
            Capacity::Limited(5).tightest(Capacity::Limited(3)),
            Capacity::Limited(3)
        );
        assert_eq!(
            Capacity::Unbounded.tightest(Capacity::Limited(4)),
            Capacity::Limited(4)
        );
        assert_eq!(
            Capacity::Limited(4).tightest(Capacity::Unbounded),
            Capacity::Limited(4)
        );
        assert_eq!(
            Capacity::Unbounded.tightest(Capacity::Unbounded),
            Capacity::Unbounded
        );
    }

    #[test]
    fn test_summary_of_denial() {
        let outcome: AdmissionOutcome<()> = AdmissionOutcome::Denied {
            reason: DenialReason::AtCapacity,
            current_count: 2,
        };
        let summary = outcome.summary();
        assert!(!summary.admitted);
        assert_eq!(summary.current_count, 2);
        assert_eq!(summary.reason, Some(DenialReason::AtCapacity));
    }

    #[test]
    fn test_denial_error_kinds() {
        assert_eq!(
            DenialReason::AtCapacity.into_error("Session").kind,
            ErrorKind::CapacityExceeded
        );
        assert_eq!(
            DenialReason::NotFound.into_error("Session").kind,
            ErrorKind::NotFound
        );
        assert_eq!(
            DenialReason::NotAdmitting.into_error("Session").kind,
            ErrorKind::NotFound
        );
    }
}
