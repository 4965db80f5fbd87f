//! Notification domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to a user's notification inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A notification was delivered.
    Created {
        /// Notification ID.
        notification_id: Uuid,
        /// Recipient.
        user_id: Uuid,
        /// Producer-defined type.
        notification_type: String,
        /// Category name.
        category: String,
        /// Subcategory name.
        subcategory: String,
        /// Priority name.
        priority: String,
        /// Title.
        title: String,
        /// Body.
        message: String,
        /// Optional deep link.
        action_url: Option<String>,
        /// Creation time.
        created_at: DateTime<Utc>,
    },
    /// A notification was marked read.
    Read {
        /// Notification ID.
        notification_id: Uuid,
        /// Recipient.
        user_id: Uuid,
    },
    /// A notification was marked unread.
    Unread {
        /// Notification ID.
        notification_id: Uuid,
        /// Recipient.
        user_id: Uuid,
    },
    /// Every unread notification was marked read.
    AllRead {
        /// Recipient.
        user_id: Uuid,
        /// Number changed.
        count: u64,
    },
    /// A notification was deleted.
    Deleted {
        /// Notification ID.
        notification_id: Uuid,
        /// Recipient.
        user_id: Uuid,
    },
}

impl NotificationEvent {
    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "notification_created",
            Self::Read { .. } => "notification_read",
            Self::Unread { .. } => "notification_unread",
            Self::AllRead { .. } => "notifications_all_read",
            Self::Deleted { .. } => "notification_deleted",
        }
    }
}
