//! # learnhub-core
//!
//! Core crate for LearnHub's real-time coordination layer. Contains
//! configuration schemas, domain events and their audiences, admission and
//! pagination value types, the event publisher seam, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other LearnHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
