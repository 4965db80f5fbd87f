//! Live sessions and their memberships.

pub mod model;
pub mod status;

pub use model::{LiveSession, SessionMembership};
pub use status::LiveSessionStatus;
