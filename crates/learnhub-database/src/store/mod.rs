//! Store traits the services are written against.
//!
//! Each trait has a PostgreSQL implementation in [`crate::repositories`] and
//! an in-memory one in [`crate::memory`]. Writes that take part in an
//! admission decision go through [`crate::admission::try_admit`] inside the
//! implementation; callers never see the lock.

pub mod live_session;
pub mod notification;
pub mod office_hours;
pub mod preference;
pub mod presence;

pub use live_session::{CapacityChange, LiveSessionStore, SessionEnd};
pub use notification::NotificationStore;
pub use office_hours::{NewQueueEntry, OfficeHoursStore};
pub use preference::PreferenceStore;
pub use presence::{PresenceStore, PresenceTransition};
