//! Presence record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::PresenceStatus;

/// Liveness record for one user. At most one exists per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PresenceRecord {
    /// Owning user.
    pub user_id: Uuid,
    /// Current status.
    pub status: PresenceStatus,
    /// Free-text activity ("Watching lesson 4").
    pub activity: Option<String>,
    /// Last heartbeat or status write.
    pub last_seen_at: DateTime<Utc>,
    /// Last write of any kind. The liveness sweep keys off this column.
    pub updated_at: DateTime<Utc>,
}

impl PresenceRecord {
    /// The implicit record of a user who never reported presence.
    pub fn unknown(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            status: PresenceStatus::Offline,
            activity: None,
            last_seen_at: now,
            updated_at: now,
        }
    }

    /// Whether the liveness sweep should demote this record.
    pub fn is_stale(&self, cutoff: DateTime<Utc>) -> bool {
        self.status.is_online() && self.updated_at < cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_stale_only_when_online_and_old() {
        let now = Utc::now();
        let mut record = PresenceRecord::unknown(Uuid::new_v4(), now - Duration::minutes(10));
        let cutoff = now - Duration::minutes(5);
        assert!(!record.is_stale(cutoff), "offline records are never stale");

        record.status = PresenceStatus::Online;
        assert!(record.is_stale(cutoff));

        record.updated_at = now;
        assert!(!record.is_stale(cutoff));
    }
}
