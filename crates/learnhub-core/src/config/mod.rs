//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a default so partial files are valid.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod notification;
pub mod presence;
pub mod realtime;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::database::{DatabaseConfig, StorageBackend};
pub use self::logging::LoggingConfig;
pub use self::notification::NotificationConfig;
pub use self::presence::PresenceConfig;
pub use self::realtime::RealtimeConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Persistence settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token verification settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Real-time WebSocket settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Presence liveness settings.
    #[serde(default)]
    pub presence: PresenceConfig,
    /// Notification fan-out settings.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with an environment-specific overlay and
    /// environment variables prefixed with `LEARNHUB__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config", env)
    }

    /// Load configuration from an explicit directory.
    pub fn load_from(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("LEARNHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject combinations that cannot start.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.database.backend == StorageBackend::Postgres && self.database.url.is_empty() {
            return Err(AppError::configuration(
                "database.url is required for the postgres backend",
            ));
        }
        if self.auth.jwt_secret.len() < 16 {
            return Err(AppError::configuration(
                "auth.jwt_secret must be at least 16 bytes",
            ));
        }
        if self.presence.stale_after_seconds == 0 {
            return Err(AppError::configuration(
                "presence.stale_after_seconds must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_describe_recommended_intervals() {
        let config = AppConfig::default();
        assert_eq!(config.presence.stale_after_seconds, 300);
        assert_eq!(config.presence.sweep_cron, "0 */2 * * * *");
        assert_eq!(config.notifications.sweep_cron, "0 */5 * * * *");
    }

    #[test]
    fn test_validate_requires_url_for_postgres() {
        let mut config = AppConfig::default();
        config.database.backend = StorageBackend::Postgres;
        config.database.url.clear();
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_validate_memory_backend_without_url() {
        let mut config = AppConfig::default();
        config.database.backend = StorageBackend::Memory;
        config.database.url.clear();
        assert!(config.validate().is_ok());
    }
}
