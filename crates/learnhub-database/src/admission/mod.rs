//! Capacity admission.
//!
//! Every capacity-gated feature admits through [`try_admit`]. A feature only
//! describes its resource as an [`AdmissionScope`]: how to lock the parent
//! record, how to find and count occupants, and how to add one. The
//! decision itself is taken here, once, while the scope holds its lock.
//!
//! A scope owns its lock for its whole lifetime. Dropping a scope without
//! calling [`AdmissionScope::commit`] discards any writes and releases the
//! lock, which is how denials are handled.

pub mod locks;

use async_trait::async_trait;

use learnhub_core::AppResult;
use learnhub_core::types::{AdmissionOutcome, Capacity, DenialReason};

pub use locks::{KeyedGuard, KeyedLocks};

/// State of the locked parent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentState {
    /// Whether the resource currently accepts new occupants.
    pub admitting: bool,
    /// Capacity recorded on the parent row itself.
    pub capacity: Capacity,
}

/// One admission attempt against one resource.
#[async_trait]
pub trait AdmissionScope: Send + Sized {
    /// What a successful admission yields (a queue entry, a membership row).
    type Occupant: Send;

    /// Lock the parent record. `None` means it does not exist.
    async fn lock_parent(&mut self) -> AppResult<Option<ParentState>>;

    /// The requester's current occupancy, if any.
    async fn find_occupant(&mut self) -> AppResult<Option<Self::Occupant>>;

    /// Number of occupants counted against capacity.
    async fn count_occupants(&mut self) -> AppResult<u32>;

    /// Record the requester as an occupant.
    async fn occupy(&mut self) -> AppResult<Self::Occupant>;

    /// Make the writes durable and release the lock.
    async fn commit(self) -> AppResult<()>;
}

/// Try to occupy one slot of the scope's resource.
///
/// `requested` is the capacity the caller believes applies; the row's own
/// capacity is read under the lock and the tighter of the two wins, so a
/// concurrent capacity edit can never be bypassed.
pub async fn try_admit<S: AdmissionScope>(
    mut scope: S,
    requested: Capacity,
) -> AppResult<AdmissionOutcome<S::Occupant>> {
    let Some(parent) = scope.lock_parent().await? else {
        return Ok(AdmissionOutcome::Denied {
            reason: DenialReason::NotFound,
            current_count: 0,
        });
    };

    let current_count = scope.count_occupants().await?;

    if !parent.admitting {
        return Ok(AdmissionOutcome::Denied {
            reason: DenialReason::NotAdmitting,
            current_count,
        });
    }

    if let Some(occupant) = scope.find_occupant().await? {
        scope.commit().await?;
        return Ok(AdmissionOutcome::Admitted {
            occupant,
            current_count,
            already_present: true,
        });
    }

    if !requested.tightest(parent.capacity).has_room(current_count) {
        return Ok(AdmissionOutcome::Denied {
            reason: DenialReason::AtCapacity,
            current_count,
        });
    }

    let occupant = scope.occupy().await?;
    scope.commit().await?;

    Ok(AdmissionOutcome::Admitted {
        occupant,
        current_count: current_count + 1,
        already_present: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnhub_core::AppError;

    /// Scripted scope recording what the algorithm asked of it.
    #[derive(Debug, Default)]
    struct FakeScope {
        parent: Option<ParentState>,
        existing: Option<u32>,
        occupants: u32,
        occupied: bool,
        fail_occupy: bool,
    }

    #[async_trait]
    impl AdmissionScope for FakeScope {
        type Occupant = u32;

        async fn lock_parent(&mut self) -> AppResult<Option<ParentState>> {
            Ok(self.parent)
        }

        async fn find_occupant(&mut self) -> AppResult<Option<u32>> {
            Ok(self.existing)
        }

        async fn count_occupants(&mut self) -> AppResult<u32> {
            Ok(self.occupants)
        }

        async fn occupy(&mut self) -> AppResult<u32> {
            if self.fail_occupy {
                return Err(AppError::database("insert failed"));
            }
            self.occupied = true;
            Ok(self.occupants + 1)
        }

        async fn commit(self) -> AppResult<()> {
            Ok(())
        }
    }

    fn open(capacity: Capacity) -> Option<ParentState> {
        Some(ParentState {
            admitting: true,
            capacity,
        })
    }

    #[tokio::test]
    async fn test_missing_parent_is_not_found() {
        let outcome = try_admit(FakeScope::default(), Capacity::Unbounded)
            .await
            .unwrap();
        assert_eq!(outcome.reason(), Some(DenialReason::NotFound));
    }

    #[tokio::test]
    async fn test_closed_parent_is_not_admitting() {
        let scope = FakeScope {
            parent: Some(ParentState {
                admitting: false,
                capacity: Capacity::Limited(10),
            }),
            occupants: 3,
            ..Default::default()
        };
        let outcome = try_admit(scope, Capacity::Limited(10)).await.unwrap();
        assert_eq!(outcome.reason(), Some(DenialReason::NotAdmitting));
        assert_eq!(outcome.current_count(), 3);
    }

    #[tokio::test]
    async fn test_admits_below_capacity() {
        let scope = FakeScope {
            parent: open(Capacity::Limited(2)),
            occupants: 1,
            ..Default::default()
        };
        match try_admit(scope, Capacity::Limited(2)).await.unwrap() {
            AdmissionOutcome::Admitted {
                current_count,
                already_present,
                ..
            } => {
                assert_eq!(current_count, 2);
                assert!(!already_present);
            }
            other => panic!("expected admission, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_denies_at_capacity() {
        let scope = FakeScope {
            parent: open(Capacity::Limited(2)),
            occupants: 2,
            ..Default::default()
        };
        let outcome = try_admit(scope, Capacity::Limited(2)).await.unwrap();
        assert_eq!(outcome.reason(), Some(DenialReason::AtCapacity));
        assert_eq!(outcome.current_count(), 2);
    }

    #[tokio::test]
    async fn test_row_capacity_overrides_stale_request() {
        // Caller read capacity 5 before the owner lowered it to 2.
        let scope = FakeScope {
            parent: open(Capacity::Limited(2)),
            occupants: 2,
            ..Default::default()
        };
        let outcome = try_admit(scope, Capacity::Limited(5)).await.unwrap();
        assert_eq!(outcome.reason(), Some(DenialReason::AtCapacity));
    }

    #[tokio::test]
    async fn test_existing_occupant_is_not_double_counted() {
        let scope = FakeScope {
            parent: open(Capacity::Limited(2)),
            existing: Some(7),
            occupants: 2,
            ..Default::default()
        };
        match try_admit(scope, Capacity::Limited(2)).await.unwrap() {
            AdmissionOutcome::Admitted {
                occupant,
                current_count,
                already_present,
            } => {
                assert_eq!(occupant, 7);
                assert_eq!(current_count, 2);
                assert!(already_present);
            }
            other => panic!("expected re-admission, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let scope = FakeScope {
            parent: open(Capacity::Unbounded),
            fail_occupy: true,
            ..Default::default()
        };
        let err = try_admit(scope, Capacity::Unbounded).await.unwrap_err();
        assert!(err.is_transient());
    }
}
