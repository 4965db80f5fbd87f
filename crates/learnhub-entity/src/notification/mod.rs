//! Notification entities: inbox rows, deferred queue rows, and preferences.

pub mod category;
pub mod model;
pub mod preference;
pub mod queue;

pub use category::{DeliveryChannel, NotificationCategory, NotificationSubcategory};
pub use model::{NewNotification, Notification, NotificationPriority};
pub use preference::{
    ChannelOverrides, DigestFrequency, GlobalToggles, NotificationPreferences, PreferenceSettings,
    QuietHours, TriState,
};
pub use queue::QueuedNotification;
