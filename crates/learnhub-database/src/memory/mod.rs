//! In-memory implementations of the store traits.
//!
//! Used for single-node development and tests. Admission runs through the
//! same [`crate::admission::try_admit`] as PostgreSQL; the row lock is
//! replaced by a per-resource async mutex from [`KeyedLocks`].
//!
//! [`KeyedLocks`]: crate::admission::KeyedLocks

pub mod live_session;
pub mod notification;
pub mod office_hours;
pub mod preference;
pub mod presence;

pub use live_session::MemoryLiveSessionStore;
pub use notification::MemoryNotificationStore;
pub use office_hours::MemoryOfficeHoursStore;
pub use preference::MemoryPreferenceStore;
pub use presence::MemoryPresenceStore;
