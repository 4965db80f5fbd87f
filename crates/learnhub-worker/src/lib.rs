//! Scheduled sweeps for LearnHub.
//!
//! This crate provides:
//! - A sweep executor that dispatches a sweep by name and refuses
//!   overlapping runs of the same sweep
//! - A cron scheduler that triggers the sweeps periodically
//! - The two sweeps: presence liveness and the notification queue

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{SweepError, SweepExecutor, SweepHandler, SweepRun};
pub use scheduler::CronScheduler;
