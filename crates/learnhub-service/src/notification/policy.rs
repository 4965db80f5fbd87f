//! Delivery policy resolution.
//!
//! Pure functions over a user's preference settings. For one channel:
//!
//! 1. security-critical subcategories are always on for in-app;
//! 2. a channel switched off globally is off;
//! 3. an explicit subcategory override wins;
//! 4. otherwise the category toggle decides.

use serde::{Deserialize, Serialize};

use learnhub_entity::notification::{
    DeliveryChannel, GlobalToggles, NotificationSubcategory, PreferenceSettings, TriState,
};

/// Resolve a single channel from the three preference tiers.
pub fn resolve_channel(
    global: &GlobalToggles,
    category_enabled: bool,
    subcategory_override: TriState,
    subcategory: NotificationSubcategory,
    channel: DeliveryChannel,
) -> bool {
    if channel == DeliveryChannel::InApp && subcategory.is_security_critical() {
        return true;
    }
    if !global.channel_enabled(channel) {
        return false;
    }
    subcategory_override.resolve(category_enabled)
}

/// Per-channel verdict for one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDecision {
    /// Deliver (or defer) an inbox notification.
    pub in_app: bool,
    /// Hand the notification to the email relay.
    pub email: bool,
}

impl DeliveryDecision {
    /// Resolve both channels for `subcategory` against stored settings.
    pub fn resolve(settings: &PreferenceSettings, subcategory: NotificationSubcategory) -> Self {
        let category_enabled = settings.category_enabled(subcategory.category());
        let resolve = |channel| {
            resolve_channel(
                &settings.global,
                category_enabled,
                settings.override_for(subcategory, channel),
                subcategory,
                channel,
            )
        };
        Self {
            in_app: resolve(DeliveryChannel::InApp),
            email: resolve(DeliveryChannel::Email),
        }
    }

    /// Verdict for one channel.
    pub fn for_channel(&self, channel: DeliveryChannel) -> bool {
        match channel {
            DeliveryChannel::InApp => self.in_app,
            DeliveryChannel::Email => self.email,
        }
    }

    /// Nothing is delivered on any channel.
    pub fn is_suppressed(&self) -> bool {
        !self.in_app && !self.email
    }
}
