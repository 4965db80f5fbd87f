//! Live-session service.
//!
//! Seats are hard-capped. A denied join is an ordinary outcome surfaced as
//! `CapacityExceeded`; the service never retries it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_core::error::AppError;
use learnhub_core::events::{Audience, EventPayload, LiveSessionEvent, Room};
use learnhub_core::types::{AdmissionOutcome, Capacity};
use learnhub_database::store::{CapacityChange, LiveSessionStore};
use learnhub_entity::live_session::{LiveSession, LiveSessionStatus, SessionMembership};

use crate::context::RequestContext;
use crate::events::EventSink;

/// Input for creating a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLiveSession {
    /// Display title.
    pub title: String,
    /// Seats.
    pub capacity: u32,
    /// Planned start.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Course the session belongs to.
    pub course_id: Option<Uuid>,
}

/// A held seat and the occupancy when it was granted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionJoin {
    /// The membership row.
    pub membership: SessionMembership,
    /// Seats held after the join.
    pub current_count: u32,
    /// Session capacity.
    pub capacity: u32,
    /// The caller already held the seat.
    pub already_joined: bool,
}

/// Runs live sessions.
#[derive(Debug, Clone)]
pub struct LiveSessionService {
    /// Session and membership storage.
    store: Arc<dyn LiveSessionStore>,
    /// Broadcast sink.
    events: EventSink,
}

impl LiveSessionService {
    /// Creates a new live-session service.
    pub fn new(store: Arc<dyn LiveSessionStore>, events: EventSink) -> Self {
        Self { store, events }
    }

    /// Schedule a session owned by the caller.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateLiveSession,
    ) -> AppResult<LiveSession> {
        ctx.require_host()?;
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Session title is required"));
        }
        let capacity = validate_capacity(input.capacity)?;

        let now = Utc::now();
        let session = LiveSession {
            id: Uuid::new_v4(),
            owner_id: ctx.user_id,
            course_id: input.course_id,
            title: title.to_string(),
            capacity,
            status: LiveSessionStatus::Scheduled,
            scheduled_at: input.scheduled_at,
            started_at: None,
            ended_at: None,
            created_at: now,
            updated_at: now,
        };
        let created = self.store.create(&session).await?;
        info!(session_id = %created.id, owner_id = %ctx.user_id, capacity, "Live session created");
        Ok(created)
    }

    /// Fetch a session.
    pub async fn get(&self, session_id: Uuid) -> AppResult<LiveSession> {
        self.store
            .find(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Live session not found"))
    }

    /// scheduled → live. Owner only.
    pub async fn start(&self, ctx: &RequestContext, session_id: Uuid) -> AppResult<LiveSession> {
        let session = self.owned(ctx, session_id).await?;
        let started = self.move_to(&session, LiveSessionStatus::Live).await?;
        self.events
            .emit(
                Audience::Room(Room::LiveSession(session_id)),
                Some(ctx.user_id),
                EventPayload::LiveSession(LiveSessionEvent::Started { session_id }),
            )
            .await;
        Ok(started)
    }

    /// scheduled → cancelled. Owner only.
    pub async fn cancel(&self, ctx: &RequestContext, session_id: Uuid) -> AppResult<LiveSession> {
        let session = self.owned(ctx, session_id).await?;
        let cancelled = self
            .move_to(&session, LiveSessionStatus::Cancelled)
            .await?;
        self.events
            .emit(
                Audience::Room(Room::LiveSession(session_id)),
                Some(ctx.user_id),
                EventPayload::LiveSession(LiveSessionEvent::Cancelled { session_id }),
            )
            .await;
        Ok(cancelled)
    }

    /// live → ended, releasing every held seat in the same write. Owner only.
    pub async fn end(&self, ctx: &RequestContext, session_id: Uuid) -> AppResult<LiveSession> {
        let session = self.owned(ctx, session_id).await?;
        let ended = self
            .store
            .end(session_id, Utc::now())
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Live session is {} and cannot be ended",
                    session.status.as_str()
                ))
            })?;

        let released = u32::try_from(ended.released.len()).unwrap_or(u32::MAX);
        info!(session_id = %session_id, released, "Live session ended");

        self.events
            .emit(
                Audience::Room(Room::LiveSession(session_id)),
                Some(ctx.user_id),
                EventPayload::LiveSession(LiveSessionEvent::Ended {
                    session_id,
                    released,
                }),
            )
            .await;
        for member in &ended.released {
            self.events
                .emit(
                    Audience::User(member.user_id),
                    Some(ctx.user_id),
                    EventPayload::LiveSession(LiveSessionEvent::AttendeeLeft {
                        session_id,
                        user_id: member.user_id,
                        attendance_minutes: member.attendance_minutes,
                    }),
                )
                .await;
        }
        Ok(ended.session)
    }

    /// Change capacity while scheduled, never below current occupancy. Owner only.
    pub async fn update_capacity(
        &self,
        ctx: &RequestContext,
        session_id: Uuid,
        capacity: u32,
    ) -> AppResult<LiveSession> {
        validate_capacity(capacity)?;
        self.owned(ctx, session_id).await?;

        let updated = match self
            .store
            .update_capacity(session_id, capacity, Utc::now())
            .await?
        {
            CapacityChange::Updated(session) => session,
            CapacityChange::NotFound => {
                return Err(AppError::not_found("Live session not found"));
            }
            CapacityChange::NotEditable(status) => {
                return Err(AppError::not_found(format!(
                    "Capacity can only change while scheduled; session is {}",
                    status.as_str()
                )));
            }
            CapacityChange::BelowOccupancy { current } => {
                return Err(AppError::conflict(format!(
                    "Capacity {capacity} is below the {current} attendees already joined"
                )));
            }
        };

        self.events
            .emit(
                Audience::Room(Room::LiveSession(session_id)),
                Some(ctx.user_id),
                EventPayload::LiveSession(LiveSessionEvent::CapacityChanged {
                    session_id,
                    capacity,
                }),
            )
            .await;
        Ok(updated)
    }

    /// Take a seat. Idempotent for a caller who already holds one.
    pub async fn join(&self, ctx: &RequestContext, session_id: Uuid) -> AppResult<SessionJoin> {
        let session = self.get(session_id).await?;
        let outcome = self
            .store
            .join(
                session_id,
                ctx.user_id,
                Capacity::Limited(session.seats()),
                Utc::now(),
            )
            .await?;

        let (membership, current_count, already_joined) = match outcome {
            AdmissionOutcome::Admitted {
                occupant,
                current_count,
                already_present,
            } => (occupant, current_count, already_present),
            AdmissionOutcome::Denied {
                reason,
                current_count,
            } => {
                info!(
                    session_id = %session_id,
                    user_id = %ctx.user_id,
                    reason = %reason,
                    current_count,
                    "Live session join denied"
                );
                return Err(reason.into_error("Live session"));
            }
        };

        if !already_joined {
            let event = LiveSessionEvent::AttendeeJoined {
                session_id,
                user_id: ctx.user_id,
                current_count,
                capacity: session.seats(),
            };
            self.notify_room_and_owner(&session, ctx.user_id, event).await;
        }

        Ok(SessionJoin {
            membership,
            current_count,
            capacity: session.seats(),
            already_joined,
        })
    }

    /// Give up a seat, closing the visit.
    pub async fn leave(
        &self,
        ctx: &RequestContext,
        session_id: Uuid,
    ) -> AppResult<SessionMembership> {
        let session = self.get(session_id).await?;
        let membership = self
            .store
            .leave(session_id, ctx.user_id, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("Not currently in this live session"))?;

        let event = LiveSessionEvent::AttendeeLeft {
            session_id,
            user_id: ctx.user_id,
            attendance_minutes: membership.attendance_minutes,
        };
        self.notify_room_and_owner(&session, ctx.user_id, event).await;
        Ok(membership)
    }

    /// Members currently holding seats.
    pub async fn list_attendees(&self, session_id: Uuid) -> AppResult<Vec<SessionMembership>> {
        self.get(session_id).await?;
        self.store.list_attendees(session_id).await
    }

    /// Membership events go to the room and to the owner, who may not be subscribed.
    async fn notify_room_and_owner(
        &self,
        session: &LiveSession,
        actor_id: Uuid,
        event: LiveSessionEvent,
    ) {
        self.events
            .emit(
                Audience::Room(Room::LiveSession(session.id)),
                Some(actor_id),
                EventPayload::LiveSession(event.clone()),
            )
            .await;
        self.events
            .emit(
                Audience::User(session.owner_id),
                Some(actor_id),
                EventPayload::LiveSession(event),
            )
            .await;
    }

    async fn move_to(
        &self,
        session: &LiveSession,
        next: LiveSessionStatus,
    ) -> AppResult<LiveSession> {
        self.store
            .transition(session.id, session.status, next, Utc::now())
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Live session cannot move from {} to {}",
                    session.status.as_str(),
                    next.as_str()
                ))
            })
    }

    async fn owned(&self, ctx: &RequestContext, session_id: Uuid) -> AppResult<LiveSession> {
        let session = self.get(session_id).await?;
        ctx.require_owner(session.owner_id, "session")?;
        Ok(session)
    }
}

fn validate_capacity(capacity: u32) -> AppResult<i32> {
    if capacity == 0 {
        return Err(AppError::validation("Capacity must be at least 1"));
    }
    i32::try_from(capacity).map_err(|_| AppError::validation("Capacity is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingPublisher, ctx};
    use learnhub_core::error::ErrorKind;
    use learnhub_database::memory::MemoryLiveSessionStore;
    use learnhub_entity::user::UserRole;

    async fn setup(
        capacity: u32,
    ) -> (
        LiveSessionService,
        Arc<RecordingPublisher>,
        RequestContext,
        LiveSession,
    ) {
        let (recorder, sink) = RecordingPublisher::sink();
        let svc = LiveSessionService::new(Arc::new(MemoryLiveSessionStore::new()), sink);
        let owner = ctx(UserRole::Instructor);
        let session = svc
            .create(
                &owner,
                CreateLiveSession {
                    title: "Ownership deep dive".to_string(),
                    capacity,
                    scheduled_at: None,
                    course_id: None,
                },
            )
            .await
            .unwrap();
        (svc, recorder, owner, session)
    }

    #[tokio::test]
    async fn test_capacity_two_walkthrough() {
        let (svc, _, _, session) = setup(2).await;
        let x = ctx(UserRole::Student);
        let y = ctx(UserRole::Student);
        let z = ctx(UserRole::Student);

        assert_eq!(svc.join(&x, session.id).await.unwrap().current_count, 1);
        assert_eq!(svc.join(&y, session.id).await.unwrap().current_count, 2);

        let err = svc.join(&z, session.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::CapacityExceeded);

        svc.leave(&x, session.id).await.unwrap();
        let joined = svc.join(&z, session.id).await.unwrap();
        assert_eq!(joined.current_count, 2);
        assert!(!joined.already_joined);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_parallel_joins_admit_exactly_capacity() {
        let (svc, _, _, session) = setup(3).await;
        let svc = Arc::new(svc);
        let session_id = session.id;

        let attempts = (0..40).map(|_| {
            let svc = svc.clone();
            let caller = ctx(UserRole::Student);
            tokio::spawn(async move { svc.join(&caller, session_id).await })
        });
        let results: Vec<_> = futures::future::join_all(attempts)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let admitted = results.iter().filter(|r| r.is_ok()).count();
        let full = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.kind == ErrorKind::CapacityExceeded))
            .count();
        assert_eq!(admitted, 3);
        assert_eq!(full, 37);
        assert_eq!(svc.list_attendees(session.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rejoin_is_idempotent() {
        let (svc, recorder, owner, session) = setup(1).await;
        let x = ctx(UserRole::Student);
        svc.join(&x, session.id).await.unwrap();
        let again = svc.join(&x, session.id).await.unwrap();
        assert!(again.already_joined);
        assert_eq!(again.current_count, 1);
        assert_eq!(recorder.sent_to(Audience::User(owner.user_id)), vec!["attendee_joined"]);
    }

    #[tokio::test]
    async fn test_join_notifies_room_and_owner() {
        let (svc, recorder, owner, session) = setup(4).await;
        let x = ctx(UserRole::Student);
        svc.join(&x, session.id).await.unwrap();
        svc.leave(&x, session.id).await.unwrap();

        let room = Audience::Room(Room::LiveSession(session.id));
        assert_eq!(recorder.sent_to(room), vec!["attendee_joined", "attendee_left"]);
        assert_eq!(
            recorder.sent_to(Audience::User(owner.user_id)),
            vec!["attendee_joined", "attendee_left"]
        );
    }

    #[tokio::test]
    async fn test_lifecycle_and_end_releases_seats() {
        let (svc, recorder, owner, session) = setup(5).await;
        let members: Vec<RequestContext> = (0..3).map(|_| ctx(UserRole::Student)).collect();
        for m in &members {
            svc.join(m, session.id).await.unwrap();
        }

        let err = svc.end(&owner, session.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound, "cannot end before start");

        svc.start(&owner, session.id).await.unwrap();
        let ended = svc.end(&owner, session.id).await.unwrap();
        assert_eq!(ended.status, LiveSessionStatus::Ended);
        assert!(svc.list_attendees(session.id).await.unwrap().is_empty());
        for m in &members {
            assert!(recorder.sent_to(Audience::User(m.user_id)).contains(&"attendee_left"));
        }

        let err = svc.join(&ctx(UserRole::Student), session.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_capacity_edit_rules() {
        let (svc, _, owner, session) = setup(3).await;
        svc.join(&ctx(UserRole::Student), session.id).await.unwrap();
        svc.join(&ctx(UserRole::Student), session.id).await.unwrap();

        let err = svc.update_capacity(&owner, session.id, 1).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let err = svc.update_capacity(&owner, session.id, 0).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let updated = svc.update_capacity(&owner, session.id, 2).await.unwrap();
        assert_eq!(updated.capacity, 2);

        let intruder = ctx(UserRole::Instructor);
        let err = svc.update_capacity(&intruder, session.id, 10).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        svc.start(&owner, session.id).await.unwrap();
        let err = svc.update_capacity(&owner, session.id, 10).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_cancel_only_from_scheduled() {
        let (svc, _, owner, session) = setup(2).await;
        svc.start(&owner, session.id).await.unwrap();
        let err = svc.cancel(&owner, session.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_leave_without_seat_is_not_found() {
        let (svc, _, _, session) = setup(2).await;
        let err = svc.leave(&ctx(UserRole::Student), session.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
