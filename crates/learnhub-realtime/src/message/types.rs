//! Inbound and outbound WebSocket message type definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use learnhub_core::events::DomainEvent;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Subscribe to a channel.
    Subscribe {
        /// Channel name.
        channel: String,
    },
    /// Unsubscribe from a channel.
    Unsubscribe {
        /// Channel name.
        channel: String,
    },
    /// Refresh presence liveness without changing status.
    Heartbeat,
    /// Set presence status and activity.
    SetStatus {
        /// New status.
        status: String,
        /// Free-text activity.
        #[serde(default)]
        activity: Option<String>,
    },
    /// Pong response to server ping.
    Pong {
        /// Echoed timestamp.
        #[serde(default)]
        timestamp: Option<i64>,
    },
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Sent once after the upgrade.
    Connected {
        /// Connection ID.
        connection_id: Uuid,
        /// Authenticated user.
        user_id: Uuid,
        /// Channels subscribed automatically.
        channels: Vec<String>,
    },
    /// A domain event delivered on a channel.
    Event {
        /// Channel the event was published to.
        channel: String,
        /// Event name, e.g. `queue_updated`.
        event: String,
        /// The event with its metadata.
        data: DomainEvent,
    },
    /// Subscription confirmed.
    Subscribed {
        /// Channel name.
        channel: String,
    },
    /// Unsubscription confirmed.
    Unsubscribed {
        /// Channel name.
        channel: String,
    },
    /// Ping (server keepalive).
    Ping {
        /// Server timestamp.
        timestamp: i64,
    },
    /// Error message.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundMessage {
    /// Builds an error frame.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Serializes for the socket. Serialization of these types cannot fail
    /// in practice; a failure yields an empty frame that clients ignore.
    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
