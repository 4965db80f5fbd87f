//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::category::NotificationSubcategory;

/// Delivery priority.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "notification_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// Informational.
    Low,
    /// Default.
    #[default]
    Normal,
    /// Worth interrupting for.
    High,
    /// Needs attention now.
    Urgent,
}

impl NotificationPriority {
    /// Return the priority as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A delivered notification in a user's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The recipient user.
    pub user_id: Uuid,
    /// Producer-defined type ("lesson.completed").
    pub notification_type: String,
    /// Category name, denormalised from the subcategory.
    pub category: String,
    /// Subcategory name.
    pub subcategory: String,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Optional deep link.
    pub action_url: Option<String>,
    /// Additional structured data.
    pub payload: Option<serde_json::Value>,
    /// Whether the user has read this notification.
    pub is_read: bool,
    /// When the notification was read.
    pub read_at: Option<DateTime<Utc>>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build the row for a freshly delivered notification.
    pub fn from_new(new: NewNotification, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            notification_type: new.notification_type,
            category: new.subcategory.category().as_str().to_string(),
            subcategory: new.subcategory.as_str().to_string(),
            priority: new.priority,
            title: new.title,
            message: new.message,
            action_url: new.action_url,
            payload: new.payload,
            is_read: false,
            read_at: None,
            created_at: now,
        }
    }
}

/// Producer input for a notification, before policy resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: Uuid,
    /// Producer-defined type.
    pub notification_type: String,
    /// Subcategory; its category is implied.
    pub subcategory: NotificationSubcategory,
    /// Priority.
    #[serde(default)]
    pub priority: NotificationPriority,
    /// Title.
    pub title: String,
    /// Body.
    pub message: String,
    /// Optional deep link.
    #[serde(default)]
    pub action_url: Option<String>,
    /// Additional structured data.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_new_denormalises_category() {
        let new = NewNotification {
            user_id: Uuid::new_v4(),
            notification_type: "lesson.completed".to_string(),
            subcategory: NotificationSubcategory::LessonCompletion,
            priority: NotificationPriority::Low,
            title: "Nice work".to_string(),
            message: "Lesson 3 done".to_string(),
            action_url: None,
            payload: None,
        };
        let now = Utc::now();
        let n = Notification::from_new(new, now);
        assert_eq!(n.category, "progress");
        assert_eq!(n.subcategory, "lesson_completion");
        assert!(!n.is_read);
        assert_eq!(n.created_at, now);
    }
}
