//! Domain events emitted by the coordination layer.
//!
//! Every state change that other observers care about produces a
//! [`DomainEvent`] addressed to an [`Audience`]. The real-time transport
//! maps audiences onto its channels; services never name channels directly.

pub mod live_session;
pub mod notification;
pub mod office_hours;
pub mod presence;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use live_session::LiveSessionEvent;
pub use notification::NotificationEvent;
pub use office_hours::{OfficeHoursEvent, QueueChange};
pub use presence::PresenceEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The user who caused the event (if applicable).
    pub actor_id: Option<Uuid>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum EventPayload {
    /// A presence change.
    Presence(PresenceEvent),
    /// An office-hours queue transition.
    OfficeHours(OfficeHoursEvent),
    /// A live-session membership or lifecycle change.
    LiveSession(LiveSessionEvent),
    /// A notification record change.
    Notification(NotificationEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(actor_id: Option<Uuid>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id,
            payload,
        }
    }

    /// Short machine name of the event, used as the wire message type.
    pub fn name(&self) -> &'static str {
        match &self.payload {
            EventPayload::Presence(e) => e.name(),
            EventPayload::OfficeHours(e) => e.name(),
            EventPayload::LiveSession(e) => e.name(),
            EventPayload::Notification(e) => e.name(),
        }
    }
}

/// A room scope that observers subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Room {
    /// An instructor's office-hours queue view.
    OfficeHoursQueue(Uuid),
    /// A live-session room.
    LiveSession(Uuid),
    /// A course-wide room.
    Course(Uuid),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::OfficeHoursQueue(id) => write!(f, "office_hours:{id}"),
            Room::LiveSession(id) => write!(f, "live_session:{id}"),
            Room::Course(id) => write!(f, "course:{id}"),
        }
    }
}

/// Who an event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Audience {
    /// Every connection of one user.
    User(Uuid),
    /// Every subscriber of a room.
    Room(Room),
    /// Every connected client.
    Global,
}
