//! Live sessions: lifecycle and capacity-gated membership.

pub mod service;

pub use service::{CreateLiveSession, LiveSessionService, SessionJoin};
