//! Notification preference entity.
//!
//! Preferences form three tiers: global channel toggles, one boolean per
//! category, and per-subcategory overrides. An override is a [`TriState`]
//! per channel; `Inherit` defers to the owning category's boolean.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use learnhub_core::AppError;

use super::category::{DeliveryChannel, NotificationCategory, NotificationSubcategory};

/// Explicit subcategory override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    /// Use the owning category's value.
    #[default]
    Inherit,
    /// Always deliver on this channel.
    ForceOn,
    /// Never deliver on this channel.
    ForceOff,
}

impl TriState {
    /// The explicit value, if one is set.
    pub fn explicit(&self) -> Option<bool> {
        match self {
            TriState::Inherit => None,
            TriState::ForceOn => Some(true),
            TriState::ForceOff => Some(false),
        }
    }

    /// Effective value given the inherited one.
    pub fn resolve(&self, inherited: bool) -> bool {
        self.explicit().unwrap_or(inherited)
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => TriState::Inherit,
            Some(true) => TriState::ForceOn,
            Some(false) => TriState::ForceOff,
        }
    }
}

/// How often email digests go out. Batching itself happens in the email relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestFrequency {
    /// One email per notification.
    Immediate,
    /// Daily summary.
    #[default]
    Daily,
    /// Weekly summary.
    Weekly,
}

/// Tier one: channel master switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalToggles {
    /// In-app delivery master switch.
    #[serde(default = "default_true")]
    pub in_app_enabled: bool,
    /// Email delivery master switch.
    #[serde(default = "default_true")]
    pub email_enabled: bool,
    /// Email digest cadence.
    #[serde(default)]
    pub digest: DigestFrequency,
}

impl GlobalToggles {
    /// Master switch for one channel.
    pub fn channel_enabled(&self, channel: DeliveryChannel) -> bool {
        match channel {
            DeliveryChannel::InApp => self.in_app_enabled,
            DeliveryChannel::Email => self.email_enabled,
        }
    }
}

impl Default for GlobalToggles {
    fn default() -> Self {
        Self {
            in_app_enabled: true,
            email_enabled: true,
            digest: DigestFrequency::default(),
        }
    }
}

/// Tier three: per-channel overrides for one subcategory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOverrides {
    /// In-app override.
    #[serde(default)]
    pub in_app: TriState,
    /// Email override.
    #[serde(default)]
    pub email: TriState,
}

impl ChannelOverrides {
    /// Override for one channel.
    pub fn for_channel(&self, channel: DeliveryChannel) -> TriState {
        match channel {
            DeliveryChannel::InApp => self.in_app,
            DeliveryChannel::Email => self.email,
        }
    }
}

/// A daily window, in the user's local wall-clock time, during which in-app
/// notifications are held back. `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    /// Local start of the window (inclusive).
    pub start: NaiveTime,
    /// Local end of the window (exclusive).
    pub end: NaiveTime,
    /// Offset of the user's local time from UTC, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Largest real-world UTC offset in minutes (UTC+14).
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

impl QuietHours {
    /// Reject windows that cannot be evaluated.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.start == self.end {
            return Err(AppError::validation(
                "Quiet hours start and end must differ",
            ));
        }
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(AppError::validation(
                "Quiet hours UTC offset must be within ±14 hours",
            ));
        }
        Ok(())
    }

    fn local_time(&self, now: DateTime<Utc>) -> chrono::NaiveDateTime {
        now.naive_utc() + Duration::minutes(i64::from(self.utc_offset_minutes))
    }

    /// Whether `now` falls inside the window.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let t = self.local_time(now).time();
        if self.start < self.end {
            self.start <= t && t < self.end
        } else {
            t >= self.start || t < self.end
        }
    }

    /// End of the window containing `now`, or `None` when outside it.
    pub fn window_end(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.contains(now) {
            return None;
        }
        let local = self.local_time(now);
        let mut end = local.date().and_time(self.end);
        if end <= local {
            end += Duration::days(1);
        }
        Some((end - Duration::minutes(i64::from(self.utc_offset_minutes))).and_utc())
    }
}

/// The stored preference document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSettings {
    /// Tier one.
    #[serde(default)]
    pub global: GlobalToggles,
    /// Tier two. Missing categories are on.
    #[serde(default)]
    pub categories: BTreeMap<NotificationCategory, bool>,
    /// Tier three. Missing subcategories inherit on both channels.
    #[serde(default)]
    pub subcategories: BTreeMap<NotificationSubcategory, ChannelOverrides>,
    /// Optional quiet window.
    #[serde(default)]
    pub quiet_hours: Option<QuietHours>,
}

impl PreferenceSettings {
    /// Category boolean; categories default to on.
    pub fn category_enabled(&self, category: NotificationCategory) -> bool {
        self.categories.get(&category).copied().unwrap_or(true)
    }

    /// Stored override for a subcategory on one channel.
    pub fn override_for(
        &self,
        subcategory: NotificationSubcategory,
        channel: DeliveryChannel,
    ) -> TriState {
        self.subcategories
            .get(&subcategory)
            .map(|o| o.for_channel(channel))
            .unwrap_or_default()
    }

    /// Validate the document before it is stored.
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(quiet) = &self.quiet_hours {
            quiet.validate()?;
        }
        Ok(())
    }
}

/// Per-user notification delivery preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NotificationPreferences {
    /// The user these preferences belong to.
    pub user_id: Uuid,
    /// The preference document, stored as JSONB.
    #[sqlx(json)]
    pub settings: PreferenceSettings,
    /// When preferences were last updated.
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreferences {
    /// Preferences of a user who never saved any.
    pub fn default_for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            settings: PreferenceSettings::default(),
            updated_at: Utc::now(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_tristate_resolution() {
        assert!(TriState::Inherit.resolve(true));
        assert!(!TriState::Inherit.resolve(false));
        assert!(TriState::ForceOn.resolve(false));
        assert!(!TriState::ForceOff.resolve(true));
        assert_eq!(TriState::from(None), TriState::Inherit);
        assert_eq!(TriState::from(Some(false)), TriState::ForceOff);
    }

    #[test]
    fn test_tristate_serializes_as_tag() {
        let json = serde_json::to_string(&TriState::ForceOff).unwrap();
        assert_eq!(json, "\"force_off\"");
    }

    #[test]
    fn test_quiet_hours_same_day_window() {
        let q = QuietHours {
            start: hm(12, 0),
            end: hm(13, 30),
            utc_offset_minutes: 0,
        };
        assert!(!q.contains(at(11, 59)));
        assert!(q.contains(at(12, 0)));
        assert!(q.contains(at(13, 29)));
        assert!(!q.contains(at(13, 30)));
        assert_eq!(q.window_end(at(12, 15)), Some(at(13, 30)));
        assert_eq!(q.window_end(at(14, 0)), None);
    }

    #[test]
    fn test_quiet_hours_wrapping_window() {
        let q = QuietHours {
            start: hm(22, 0),
            end: hm(7, 0),
            utc_offset_minutes: 0,
        };
        assert!(q.contains(at(23, 0)));
        assert!(q.contains(at(3, 0)));
        assert!(!q.contains(at(7, 0)));
        assert!(!q.contains(at(12, 0)));
        assert_eq!(
            q.window_end(at(23, 0)),
            Some(Utc.with_ymd_and_hms(2026, 3, 11, 7, 0, 0).unwrap())
        );
        assert_eq!(q.window_end(at(3, 0)), Some(at(7, 0)));
    }

    #[test]
    fn test_quiet_hours_respects_offset() {
        // 22:00-07:00 at UTC+2 is 20:00-05:00 UTC.
        let q = QuietHours {
            start: hm(22, 0),
            end: hm(7, 0),
            utc_offset_minutes: 120,
        };
        assert!(q.contains(at(20, 30)));
        assert!(!q.contains(at(19, 30)));
        assert_eq!(q.window_end(at(4, 0)), Some(at(5, 0)));
    }

    #[test]
    fn test_quiet_hours_validation() {
        let empty = QuietHours {
            start: hm(8, 0),
            end: hm(8, 0),
            utc_offset_minutes: 0,
        };
        assert!(empty.validate().is_err());
        let far = QuietHours {
            start: hm(8, 0),
            end: hm(9, 0),
            utc_offset_minutes: 15 * 60,
        };
        assert!(far.validate().is_err());
    }

    #[test]
    fn test_settings_defaults_and_json_shape() {
        let json = serde_json::json!({
            "categories": { "progress": false },
            "subcategories": { "lesson_completion": { "email": "force_off" } }
        });
        let settings: PreferenceSettings = serde_json::from_value(json).unwrap();
        assert!(settings.global.in_app_enabled);
        assert!(!settings.category_enabled(NotificationCategory::Progress));
        assert!(settings.category_enabled(NotificationCategory::Course));
        assert_eq!(
            settings.override_for(NotificationSubcategory::LessonCompletion, DeliveryChannel::Email),
            TriState::ForceOff
        );
        assert_eq!(
            settings.override_for(NotificationSubcategory::LessonCompletion, DeliveryChannel::InApp),
            TriState::Inherit
        );
    }
}
