//! Channel type definitions and parsing.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use learnhub_core::events::{Audience, Room};

/// Typed channel identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ChannelType {
    /// Personal user channel: notifications, queue position, forced leaves.
    User(Uuid),
    /// Global presence channel.
    PresenceGlobal,
    /// An instructor's office-hours queue view.
    OfficeHours(Uuid),
    /// A live-session room.
    LiveSession(Uuid),
    /// A course-wide room.
    Course(Uuid),
}

impl ChannelType {
    /// Parses a channel string into a typed channel.
    pub fn parse(channel: &str) -> Option<Self> {
        let parts: Vec<&str> = channel.splitn(2, ':').collect();
        match parts.as_slice() {
            ["user", id] => Uuid::parse_str(id).ok().map(ChannelType::User),
            ["presence", "global"] => Some(ChannelType::PresenceGlobal),
            ["office_hours", id] => Uuid::parse_str(id).ok().map(ChannelType::OfficeHours),
            ["live_session", id] => Uuid::parse_str(id).ok().map(ChannelType::LiveSession),
            ["course", id] => Uuid::parse_str(id).ok().map(ChannelType::Course),
            _ => None,
        }
    }

    /// Whether a connection may drop this channel.
    ///
    /// The personal channel carries notifications and forced leaves, so it
    /// stays subscribed for the life of the connection.
    pub fn is_pinned(&self) -> bool {
        matches!(self, ChannelType::User(_))
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelType::User(id) => write!(f, "user:{id}"),
            ChannelType::PresenceGlobal => write!(f, "presence:global"),
            ChannelType::OfficeHours(id) => write!(f, "office_hours:{id}"),
            ChannelType::LiveSession(id) => write!(f, "live_session:{id}"),
            ChannelType::Course(id) => write!(f, "course:{id}"),
        }
    }
}

impl From<Room> for ChannelType {
    fn from(room: Room) -> Self {
        match room {
            Room::OfficeHoursQueue(id) => ChannelType::OfficeHours(id),
            Room::LiveSession(id) => ChannelType::LiveSession(id),
            Room::Course(id) => ChannelType::Course(id),
        }
    }
}

impl From<Audience> for ChannelType {
    fn from(audience: Audience) -> Self {
        match audience {
            Audience::User(id) => ChannelType::User(id),
            Audience::Room(room) => room.into(),
            Audience::Global => ChannelType::PresenceGlobal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_every_display_form() {
        let id = Uuid::new_v4();
        for channel in [
            ChannelType::User(id),
            ChannelType::PresenceGlobal,
            ChannelType::OfficeHours(id),
            ChannelType::LiveSession(id),
            ChannelType::Course(id),
        ] {
            assert_eq!(ChannelType::parse(&channel.to_string()), Some(channel));
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        assert_eq!(ChannelType::parse("folder:abc"), None);
        assert_eq!(ChannelType::parse("user:not-a-uuid"), None);
        assert_eq!(ChannelType::parse("presence"), None);
        assert_eq!(ChannelType::parse(""), None);
    }

    #[test]
    fn test_room_channel_names_match_room_display() {
        let id = Uuid::new_v4();
        let room = Room::OfficeHoursQueue(id);
        assert_eq!(ChannelType::from(room).to_string(), room.to_string());
        assert_eq!(
            ChannelType::from(Audience::Global),
            ChannelType::PresenceGlobal
        );
    }
}
