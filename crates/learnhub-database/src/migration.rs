//! Schema migrations, embedded at compile time from `/migrations`.

use sqlx::PgPool;
use tracing::info;

use learnhub_core::error::{AppError, ErrorKind};

/// Apply every pending migration.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Applying database migrations");

    let migrator = sqlx::migrate!("../../migrations");
    let known = migrator.iter().count();

    migrator.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!(migrations = known, "Database schema is up to date");
    Ok(())
}
