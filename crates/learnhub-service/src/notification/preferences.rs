//! Preference read and replace.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_database::store::PreferenceStore;
use learnhub_entity::notification::{NotificationPreferences, PreferenceSettings};

/// Reads and writes per-user notification preferences.
#[derive(Debug, Clone)]
pub struct PreferenceService {
    /// Preference storage.
    store: Arc<dyn PreferenceStore>,
}

impl PreferenceService {
    /// Creates a new preference service.
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Stored preferences, or the defaults for a user who never saved any.
    pub async fn get(&self, user_id: Uuid) -> AppResult<NotificationPreferences> {
        Ok(self
            .store
            .find(user_id)
            .await?
            .unwrap_or_else(|| NotificationPreferences::default_for_user(user_id)))
    }

    /// Just the settings document.
    pub async fn settings_for(&self, user_id: Uuid) -> AppResult<PreferenceSettings> {
        Ok(self.get(user_id).await?.settings)
    }

    /// Validate and replace the whole document.
    pub async fn update(
        &self,
        user_id: Uuid,
        settings: PreferenceSettings,
    ) -> AppResult<NotificationPreferences> {
        settings.validate()?;
        let saved = self.store.upsert(user_id, &settings, Utc::now()).await?;
        info!(
            user_id = %user_id,
            quiet_hours = saved.settings.quiet_hours.is_some(),
            "Notification preferences updated"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use learnhub_core::error::ErrorKind;
    use learnhub_database::memory::MemoryPreferenceStore;
    use learnhub_entity::notification::QuietHours;

    #[tokio::test]
    async fn test_defaults_until_saved() {
        let svc = PreferenceService::new(Arc::new(MemoryPreferenceStore::new()));
        let user = Uuid::new_v4();
        let prefs = svc.get(user).await.unwrap();
        assert_eq!(prefs.settings, PreferenceSettings::default());

        let mut settings = PreferenceSettings::default();
        settings.global.email_enabled = false;
        svc.update(user, settings.clone()).await.unwrap();
        assert_eq!(svc.settings_for(user).await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_invalid_quiet_hours_rejected() {
        let svc = PreferenceService::new(Arc::new(MemoryPreferenceStore::new()));
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let settings = PreferenceSettings {
            quiet_hours: Some(QuietHours {
                start: noon,
                end: noon,
                utc_offset_minutes: 0,
            }),
            ..PreferenceSettings::default()
        };
        let err = svc.update(Uuid::new_v4(), settings).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
