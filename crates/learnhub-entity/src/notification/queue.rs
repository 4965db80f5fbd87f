//! Deferred (quiet-hours) notification queue rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::category::NotificationSubcategory;
use super::model::{NewNotification, NotificationPriority};

/// A notification held back during quiet hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct QueuedNotification {
    /// Queue item ID.
    pub id: Uuid,
    /// Recipient.
    pub user_id: Uuid,
    /// Producer-defined type.
    pub notification_type: String,
    /// Subcategory name.
    pub subcategory: String,
    /// Priority.
    pub priority: NotificationPriority,
    /// Title.
    pub title: String,
    /// Body.
    pub message: String,
    /// Optional deep link.
    pub action_url: Option<String>,
    /// Additional structured data.
    pub payload: Option<serde_json::Value>,
    /// Earliest time the sweep reconsiders the item.
    pub deliver_after: DateTime<Utc>,
    /// After this the item is discarded unsent.
    pub expires_at: DateTime<Utc>,
    /// When the item was queued.
    pub created_at: DateTime<Utc>,
}

impl QueuedNotification {
    /// Queue a notification for later.
    pub fn defer(
        new: NewNotification,
        deliver_after: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            notification_type: new.notification_type,
            subcategory: new.subcategory.as_str().to_string(),
            priority: new.priority,
            title: new.title,
            message: new.message,
            action_url: new.action_url,
            payload: new.payload,
            deliver_after,
            expires_at,
            created_at: now,
        }
    }

    /// Whether the item outlived its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Rebuild the producer input for promotion.
    pub fn to_new(&self) -> Result<NewNotification, learnhub_core::AppError> {
        Ok(NewNotification {
            user_id: self.user_id,
            notification_type: self.notification_type.clone(),
            subcategory: self.subcategory.parse::<NotificationSubcategory>()?,
            priority: self.priority,
            title: self.title.clone(),
            message: self.message.clone(),
            action_url: self.action_url.clone(),
            payload: self.payload.clone(),
        })
    }
}
