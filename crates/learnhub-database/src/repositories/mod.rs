//! PostgreSQL implementations of the store traits.

pub mod live_session;
pub mod notification;
pub mod office_hours;
pub mod preference;
pub mod presence;

pub use live_session::LiveSessionRepository;
pub use notification::NotificationRepository;
pub use office_hours::OfficeHoursRepository;
pub use preference::PreferenceRepository;
pub use presence::PresenceRepository;

/// Narrow a SQL `COUNT(*)` to the width services work with.
pub(crate) fn count_u32(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

/// Whether a sqlx error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
