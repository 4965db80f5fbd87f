//! Presence domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to user presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceEvent {
    /// A user's status changed, explicitly or through the liveness sweep.
    Changed {
        /// The user ID.
        user_id: Uuid,
        /// The new status.
        status: String,
        /// The status before the change, when a record existed.
        previous_status: Option<String>,
        /// Free-text activity.
        activity: Option<String>,
        /// When the record was written.
        updated_at: DateTime<Utc>,
    },
}

impl PresenceEvent {
    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Changed { .. } => "presence_changed",
        }
    }
}
