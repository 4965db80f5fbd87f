//! Store selection.

use std::sync::Arc;

use tracing::info;

use learnhub_core::AppResult;
use learnhub_core::config::{DatabaseConfig, StorageBackend};

use crate::connection::DatabasePool;
use crate::memory::{
    MemoryLiveSessionStore, MemoryNotificationStore, MemoryOfficeHoursStore,
    MemoryPreferenceStore, MemoryPresenceStore,
};
use crate::migration::run_migrations;
use crate::repositories::{
    LiveSessionRepository, NotificationRepository, OfficeHoursRepository, PreferenceRepository,
    PresenceRepository,
};
use crate::store::{
    LiveSessionStore, NotificationStore, OfficeHoursStore, PreferenceStore, PresenceStore,
};

/// One implementation of every store, chosen by `database.backend`.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Presence records.
    pub presence: Arc<dyn PresenceStore>,
    /// Office-hours schedules and queue.
    pub office_hours: Arc<dyn OfficeHoursStore>,
    /// Live sessions and memberships.
    pub live_sessions: Arc<dyn LiveSessionStore>,
    /// Notification inbox and deferred queue.
    pub notifications: Arc<dyn NotificationStore>,
    /// Notification preferences.
    pub preferences: Arc<dyn PreferenceStore>,
    /// The pool behind the PostgreSQL stores, if that backend is active.
    pub database: Option<DatabasePool>,
}

impl Stores {
    /// Build the stores for the configured backend, connecting and
    /// migrating when it is PostgreSQL.
    pub async fn from_config(config: &DatabaseConfig) -> AppResult<Self> {
        match config.backend {
            StorageBackend::Postgres => {
                let db = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    run_migrations(db.pool()).await?;
                }
                Ok(Self::postgres(db))
            }
            StorageBackend::Memory => {
                info!("Using in-memory stores; state is lost on restart");
                Ok(Self::memory())
            }
        }
    }

    /// PostgreSQL repositories sharing one pool.
    pub fn postgres(db: DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            presence: Arc::new(PresenceRepository::new(pool.clone())),
            office_hours: Arc::new(OfficeHoursRepository::new(pool.clone())),
            live_sessions: Arc::new(LiveSessionRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool.clone())),
            preferences: Arc::new(PreferenceRepository::new(pool)),
            database: Some(db),
        }
    }

    /// Fresh, empty in-memory stores.
    pub fn memory() -> Self {
        Self {
            presence: Arc::new(MemoryPresenceStore::new()),
            office_hours: Arc::new(MemoryOfficeHoursStore::new()),
            live_sessions: Arc::new(MemoryLiveSessionStore::new()),
            notifications: Arc::new(MemoryNotificationStore::new()),
            preferences: Arc::new(MemoryPreferenceStore::new()),
            database: None,
        }
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &'static str {
        if self.database.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    /// Whether the backing store answers. Memory stores always do.
    pub async fn health_check(&self) -> AppResult<bool> {
        match &self.database {
            Some(db) => db.health_check().await,
            None => Ok(true),
        }
    }

    /// Close the pool, if any.
    pub async fn close(&self) {
        if let Some(db) = &self.database {
            db.close().await;
        }
    }
}
