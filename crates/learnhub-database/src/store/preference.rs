//! Notification preference persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_entity::notification::{NotificationPreferences, PreferenceSettings};

/// One preference document per user.
#[async_trait]
pub trait PreferenceStore: Send + Sync + std::fmt::Debug {
    /// Stored preferences, if the user ever saved any.
    async fn find(&self, user_id: Uuid) -> AppResult<Option<NotificationPreferences>>;

    /// Replace the user's document.
    async fn upsert(
        &self,
        user_id: Uuid,
        settings: &PreferenceSettings,
        now: DateTime<Utc>,
    ) -> AppResult<NotificationPreferences>;
}
