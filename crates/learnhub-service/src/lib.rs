//! # learnhub-service
//!
//! Coordination services for LearnHub. Each service owns one concern,
//! talks to storage through the store traits, and emits domain events
//! through an [`EventSink`] only after the write it describes has committed.
//!
//! Services follow constructor injection: the stores, the event publisher,
//! and the external collaborators are provided at construction time.

pub mod context;
pub mod directory;
pub mod email;
pub mod events;
pub mod live_session;
pub mod notification;
pub mod office_hours;
pub mod presence;

#[cfg(test)]
pub(crate) mod testing;

pub use context::RequestContext;
pub use directory::{AccessDirectory, AllowAllDirectory};
pub use email::{EmailContent, EmailSender, LogEmailSender};
pub use events::EventSink;
pub use live_session::LiveSessionService;
pub use notification::{NotificationFanout, NotificationService, PreferenceService};
pub use office_hours::OfficeHoursService;
pub use presence::PresenceService;
