//! Office-hours schedules and queue entries.

pub mod model;
pub mod status;

pub use model::{OfficeHoursSchedule, QueueEntry};
pub use status::QueueEntryStatus;
