//! Presence domain entities.

pub mod model;

pub use model::PresenceRecord;

use serde::{Deserialize, Serialize};

/// Presence status for a user.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "presence_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// Connected and reachable.
    Online,
    /// Not connected, or demoted by the liveness sweep.
    #[default]
    Offline,
    /// Connected but away from the keyboard.
    Away,
    /// Connected and not to be disturbed.
    Busy,
}

impl PresenceStatus {
    /// Check if the user is considered online.
    pub fn is_online(&self) -> bool {
        !matches!(self, Self::Offline)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Away => "away",
            Self::Busy => "busy",
        }
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresenceStatus {
    type Err = learnhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            "away" => Ok(Self::Away),
            "busy" => Ok(Self::Busy),
            _ => Err(learnhub_core::AppError::validation(format!(
                "Invalid presence status: '{s}'. Expected one of: online, offline, away, busy"
            ))),
        }
    }
}
