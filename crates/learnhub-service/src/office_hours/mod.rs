//! Office-hours schedules and the per-instructor FIFO queue.

pub mod service;

pub use service::{CreateSchedule, OfficeHoursService, QueueJoin, QueueView};
