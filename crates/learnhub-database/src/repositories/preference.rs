//! Notification preference repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use learnhub_core::error::{AppError, ErrorKind};
use learnhub_core::result::AppResult;
use learnhub_entity::notification::{NotificationPreferences, PreferenceSettings};

use crate::store::PreferenceStore;

/// Repository for `notification_preferences`.
#[derive(Debug, Clone)]
pub struct PreferenceRepository {
    pool: PgPool,
}

impl PreferenceRepository {
    /// Create a new preference repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceStore for PreferenceRepository {
    async fn find(&self, user_id: Uuid) -> AppResult<Option<NotificationPreferences>> {
        sqlx::query_as::<_, NotificationPreferences>(
            "SELECT * FROM notification_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to get preferences", e))
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        settings: &PreferenceSettings,
        now: DateTime<Utc>,
    ) -> AppResult<NotificationPreferences> {
        sqlx::query_as::<_, NotificationPreferences>(
            "INSERT INTO notification_preferences (user_id, settings, updated_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET settings = $2, updated_at = $3 \
             RETURNING *",
        )
        .bind(user_id)
        .bind(Json(settings))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert preferences", e))
    }
}
