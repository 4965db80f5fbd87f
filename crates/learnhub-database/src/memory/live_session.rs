//! In-memory live-session store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_core::types::{AdmissionOutcome, Capacity};
use learnhub_entity::live_session::{LiveSession, LiveSessionStatus, SessionMembership};

use crate::admission::{AdmissionScope, KeyedGuard, KeyedLocks, ParentState, try_admit};
use crate::store::{CapacityChange, LiveSessionStore, SessionEnd};

/// Sessions and memberships. Every write to a session takes its lock.
#[derive(Debug, Default)]
pub struct MemoryLiveSessionStore {
    sessions: DashMap<Uuid, LiveSession>,
    members: DashMap<(Uuid, Uuid), SessionMembership>,
    locks: KeyedLocks,
}

impl MemoryLiveSessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn active_members(&self, session_id: Uuid) -> Vec<SessionMembership> {
        let mut active: Vec<SessionMembership> = self
            .members
            .iter()
            .filter(|m| m.session_id == session_id && m.is_active())
            .map(|m| m.clone())
            .collect();
        active.sort_by_key(|m| m.joined_at);
        active
    }

    fn count_active(&self, session_id: Uuid) -> u32 {
        let count = self
            .members
            .iter()
            .filter(|m| m.session_id == session_id && m.is_active())
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

struct SeatScope<'a> {
    store: &'a MemoryLiveSessionStore,
    session_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
    staged: Option<SessionMembership>,
    _guard: Option<KeyedGuard>,
}

#[async_trait]
impl<'a> AdmissionScope for SeatScope<'a> {
    type Occupant = SessionMembership;

    async fn lock_parent(&mut self) -> AppResult<Option<ParentState>> {
        self._guard = Some(self.store.locks.lock(self.session_id).await);
        Ok(self.store.sessions.get(&self.session_id).map(|s| ParentState {
            admitting: s.status.is_joinable(),
            capacity: Capacity::Limited(s.seats()),
        }))
    }

    async fn find_occupant(&mut self) -> AppResult<Option<SessionMembership>> {
        Ok(self
            .store
            .members
            .get(&(self.session_id, self.user_id))
            .filter(|m| m.is_active())
            .map(|m| m.clone()))
    }

    async fn count_occupants(&mut self) -> AppResult<u32> {
        Ok(self.store.count_active(self.session_id))
    }

    async fn occupy(&mut self) -> AppResult<SessionMembership> {
        let membership = match self.store.members.get(&(self.session_id, self.user_id)) {
            Some(existing) => {
                let mut reopened = existing.clone();
                reopened.reopen(self.now);
                reopened
            }
            None => SessionMembership {
                session_id: self.session_id,
                user_id: self.user_id,
                joined_at: self.now,
                left_at: None,
                attendance_minutes: 0,
            },
        };
        self.staged = Some(membership.clone());
        Ok(membership)
    }

    async fn commit(self) -> AppResult<()> {
        if let Some(m) = self.staged {
            self.store.members.insert((m.session_id, m.user_id), m);
        }
        Ok(())
    }
}

#[async_trait]
impl LiveSessionStore for MemoryLiveSessionStore {
    async fn create(&self, session: &LiveSession) -> AppResult<LiveSession> {
        self.sessions.insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<LiveSession>> {
        Ok(self.sessions.get(&id).map(|s| s.clone()))
    }

    async fn join(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        capacity: Capacity,
        now: DateTime<Utc>,
    ) -> AppResult<AdmissionOutcome<SessionMembership>> {
        let scope = SeatScope {
            store: self,
            session_id,
            user_id,
            now,
            staged: None,
            _guard: None,
        };
        try_admit(scope, capacity).await
    }

    async fn leave(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SessionMembership>> {
        let _guard = self.locks.lock(session_id).await;
        Ok(self
            .members
            .get_mut(&(session_id, user_id))
            .filter(|m| m.is_active())
            .map(|mut m| {
                m.close_visit(now);
                m.clone()
            }))
    }

    async fn transition(
        &self,
        id: Uuid,
        from: LiveSessionStatus,
        next: LiveSessionStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LiveSession>> {
        if !from.can_transition_to(next) {
            return Ok(None);
        }
        let _guard = self.locks.lock(id).await;
        let Some(mut session) = self.sessions.get_mut(&id) else {
            return Ok(None);
        };
        if session.status != from {
            return Ok(None);
        }
        session.status = next;
        match next {
            LiveSessionStatus::Live => session.started_at = Some(now),
            LiveSessionStatus::Ended | LiveSessionStatus::Cancelled => {
                session.ended_at = Some(now)
            }
            LiveSessionStatus::Scheduled => {}
        }
        session.updated_at = now;
        Ok(Some(session.clone()))
    }

    async fn end(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<SessionEnd>> {
        let _guard = self.locks.lock(id).await;
        let session = {
            let Some(mut session) = self.sessions.get_mut(&id) else {
                return Ok(None);
            };
            if session.status != LiveSessionStatus::Live {
                return Ok(None);
            }
            session.status = LiveSessionStatus::Ended;
            session.ended_at = Some(now);
            session.updated_at = now;
            session.clone()
        };

        let mut released = Vec::new();
        for mut m in self.members.iter_mut() {
            if m.session_id == id && m.is_active() {
                m.close_visit(now);
                released.push(m.clone());
            }
        }
        released.sort_by_key(|m| m.joined_at);

        Ok(Some(SessionEnd { session, released }))
    }

    async fn update_capacity(
        &self,
        id: Uuid,
        capacity: u32,
        now: DateTime<Utc>,
    ) -> AppResult<CapacityChange> {
        let _guard = self.locks.lock(id).await;
        let status = match self.sessions.get(&id) {
            Some(s) => s.status,
            None => return Ok(CapacityChange::NotFound),
        };
        if !status.allows_capacity_edit() {
            return Ok(CapacityChange::NotEditable(status));
        }
        let current = self.count_active(id);
        if capacity < current {
            return Ok(CapacityChange::BelowOccupancy { current });
        }

        let capacity = i32::try_from(capacity)
            .map_err(|_| learnhub_core::AppError::validation("Capacity is out of range"))?;
        Ok(match self.sessions.get_mut(&id) {
            Some(mut s) => {
                s.capacity = capacity;
                s.updated_at = now;
                CapacityChange::Updated(s.clone())
            }
            None => CapacityChange::NotFound,
        })
    }

    async fn list_attendees(&self, session_id: Uuid) -> AppResult<Vec<SessionMembership>> {
        Ok(self.active_members(session_id))
    }

    async fn count_attendees(&self, session_id: Uuid) -> AppResult<u32> {
        Ok(self.count_active(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn session(capacity: i32) -> LiveSession {
        let now = Utc::now();
        LiveSession {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            course_id: None,
            title: "Intro to borrowck".to_string(),
            capacity,
            status: LiveSessionStatus::Scheduled,
            scheduled_at: None,
            started_at: None,
            ended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_joins_never_exceed_capacity() {
        let store = Arc::new(MemoryLiveSessionStore::new());
        let s = store.create(&session(5)).await.unwrap();

        let attempts = (0..50).map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .join(s.id, Uuid::new_v4(), Capacity::Limited(5), Utc::now())
                    .await
                    .unwrap()
                    .is_admitted()
            })
        });
        let results = futures::future::join_all(attempts).await;
        let admitted = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();

        assert_eq!(admitted, 5);
        assert_eq!(store.count_attendees(s.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_rejoin_reuses_row_and_accumulates() {
        let store = MemoryLiveSessionStore::new();
        let s = store.create(&session(2)).await.unwrap();
        let user = Uuid::new_v4();
        let t0 = Utc::now();

        store.join(s.id, user, Capacity::Limited(2), t0).await.unwrap();
        store
            .leave(s.id, user, t0 + Duration::minutes(10))
            .await
            .unwrap()
            .unwrap();
        let AdmissionOutcome::Admitted { occupant, .. } = store
            .join(s.id, user, Capacity::Limited(2), t0 + Duration::minutes(15))
            .await
            .unwrap()
        else {
            panic!("re-join denied");
        };
        assert_eq!(occupant.attendance_minutes, 10);
        assert_eq!(occupant.joined_at, t0 + Duration::minutes(15));
        assert_eq!(store.members.len(), 1);
    }

    #[tokio::test]
    async fn test_end_releases_every_seat() {
        let store = MemoryLiveSessionStore::new();
        let s = store.create(&session(3)).await.unwrap();
        let t0 = Utc::now();
        for _ in 0..3 {
            store
                .join(s.id, Uuid::new_v4(), Capacity::Limited(3), t0)
                .await
                .unwrap();
        }
        store
            .transition(s.id, LiveSessionStatus::Scheduled, LiveSessionStatus::Live, t0)
            .await
            .unwrap()
            .unwrap();

        let end = store
            .end(s.id, t0 + Duration::minutes(45))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(end.session.status, LiveSessionStatus::Ended);
        assert_eq!(end.released.len(), 3);
        assert!(end.released.iter().all(|m| m.attendance_minutes == 45));
        assert_eq!(store.count_attendees(s.id).await.unwrap(), 0);

        let late = store
            .join(s.id, Uuid::new_v4(), Capacity::Limited(3), t0 + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(
            late.reason(),
            Some(learnhub_core::types::DenialReason::NotAdmitting)
        );
    }

    #[tokio::test]
    async fn test_capacity_edit_rules() {
        let store = MemoryLiveSessionStore::new();
        let s = store.create(&session(3)).await.unwrap();
        let now = Utc::now();
        store
            .join(s.id, Uuid::new_v4(), Capacity::Limited(3), now)
            .await
            .unwrap();
        store
            .join(s.id, Uuid::new_v4(), Capacity::Limited(3), now)
            .await
            .unwrap();

        assert!(matches!(
            store.update_capacity(s.id, 1, now).await.unwrap(),
            CapacityChange::BelowOccupancy { current: 2 }
        ));
        assert!(matches!(
            store.update_capacity(s.id, 2, now).await.unwrap(),
            CapacityChange::Updated(ref updated) if updated.capacity == 2
        ));

        store
            .transition(s.id, LiveSessionStatus::Scheduled, LiveSessionStatus::Live, now)
            .await
            .unwrap();
        assert!(matches!(
            store.update_capacity(s.id, 10, now).await.unwrap(),
            CapacityChange::NotEditable(LiveSessionStatus::Live)
        ));
    }
}
