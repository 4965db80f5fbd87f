//! # learnhub-entity
//!
//! Domain entity models for LearnHub's coordination layer. Every struct in
//! this crate represents a database table row or a domain value object.
//! Table rows additionally derive `sqlx::FromRow`.

pub mod live_session;
pub mod notification;
pub mod office_hours;
pub mod presence;
pub mod user;
