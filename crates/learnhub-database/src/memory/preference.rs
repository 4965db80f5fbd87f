//! In-memory preference store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_entity::notification::{NotificationPreferences, PreferenceSettings};

use crate::store::PreferenceStore;

/// Preference documents keyed by user.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    documents: DashMap<Uuid, NotificationPreferences>,
}

impl MemoryPreferenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn find(&self, user_id: Uuid) -> AppResult<Option<NotificationPreferences>> {
        Ok(self.documents.get(&user_id).map(|d| d.clone()))
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        settings: &PreferenceSettings,
        now: DateTime<Utc>,
    ) -> AppResult<NotificationPreferences> {
        let document = NotificationPreferences {
            user_id,
            settings: settings.clone(),
            updated_at: now,
        };
        self.documents.insert(user_id, document.clone());
        Ok(document)
    }
}
