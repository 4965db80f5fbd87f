//! Live-session persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_core::types::{AdmissionOutcome, Capacity};
use learnhub_entity::live_session::{LiveSession, LiveSessionStatus, SessionMembership};

/// Result of ending a session.
#[derive(Debug, Clone)]
pub struct SessionEnd {
    /// The session, now ended.
    pub session: LiveSession,
    /// Memberships closed by the end, with their final attendance.
    pub released: Vec<SessionMembership>,
}

/// Result of a capacity edit, decided under the session lock.
#[derive(Debug, Clone)]
pub enum CapacityChange {
    /// The new capacity was stored.
    Updated(LiveSession),
    /// No such session.
    NotFound,
    /// The session has left the scheduled state.
    NotEditable(LiveSessionStatus),
    /// More members hold seats than the requested capacity.
    BelowOccupancy {
        /// Seats held at decision time.
        current: u32,
    },
}

/// Sessions and memberships.
#[async_trait]
pub trait LiveSessionStore: Send + Sync + std::fmt::Debug {
    /// Persist a new session.
    async fn create(&self, session: &LiveSession) -> AppResult<LiveSession>;

    /// Load a session.
    async fn find(&self, id: Uuid) -> AppResult<Option<LiveSession>>;

    /// Take a seat. Re-joining reopens the user's existing row.
    async fn join(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        capacity: Capacity,
        now: DateTime<Utc>,
    ) -> AppResult<AdmissionOutcome<SessionMembership>>;

    /// Release a held seat. `None` if the user holds none.
    async fn leave(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SessionMembership>>;

    /// Move a session from `from` to `next`. `None` if it is not in `from`.
    async fn transition(
        &self,
        id: Uuid,
        from: LiveSessionStatus,
        next: LiveSessionStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LiveSession>>;

    /// End a live session and release every held seat in one atomic write.
    async fn end(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<SessionEnd>>;

    /// Change capacity while scheduled, never below current occupancy.
    async fn update_capacity(
        &self,
        id: Uuid,
        capacity: u32,
        now: DateTime<Utc>,
    ) -> AppResult<CapacityChange>;

    /// Members currently holding a seat, in join order.
    async fn list_attendees(&self, session_id: Uuid) -> AppResult<Vec<SessionMembership>>;

    /// Number of seats held.
    async fn count_attendees(&self, session_id: Uuid) -> AppResult<u32>;
}
