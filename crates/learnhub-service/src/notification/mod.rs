//! Notification policy, fan-out, inbox, and preferences.

pub mod fanout;
pub mod policy;
pub mod preferences;
pub mod service;

pub use fanout::{InAppDelivery, NotificationFanout, PublishOutcome, QueueSweepReport};
pub use policy::{DeliveryDecision, resolve_channel};
pub use preferences::PreferenceService;
pub use service::NotificationService;
