//! Built-in sweep handlers.

pub mod notification;
pub mod presence;

pub use notification::{NOTIFICATION_QUEUE_SWEEP, NotificationQueueSweepHandler};
pub use presence::{PRESENCE_SWEEP, PresenceSweepHandler};
