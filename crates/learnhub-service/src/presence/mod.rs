//! Presence tracking and the liveness sweep.

pub mod service;

pub use service::PresenceService;
