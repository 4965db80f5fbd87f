//! Route handlers organized by domain.

pub mod admin;
pub mod health;
pub mod live_session;
pub mod notification;
pub mod office_hours;
pub mod presence;
pub mod ws;
