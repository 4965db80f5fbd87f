//! Notification inbox and deferred queue persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_core::types::{PageRequest, PageResponse};
use learnhub_entity::notification::{Notification, QueuedNotification};

/// Delivered notifications and quiet-hours queue items.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug {
    /// Store a delivered notification.
    async fn insert(&self, notification: &Notification) -> AppResult<Notification>;

    /// One page of a user's inbox, newest first.
    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    /// Unread notifications of a user.
    async fn count_unread(&self, user_id: Uuid) -> AppResult<u64>;

    /// Set the read flag of a user's notification.
    async fn set_read(
        &self,
        id: Uuid,
        user_id: Uuid,
        read: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Notification>>;

    /// Mark every unread notification of a user read. Returns how many changed.
    async fn mark_all_read(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64>;

    /// Delete a user's notification. Returns whether it existed.
    async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Hold a notification back until quiet hours end.
    async fn enqueue(&self, item: &QueuedNotification) -> AppResult<QueuedNotification>;

    /// Queue items that are due (`deliver_after <= now`) or expired, oldest first.
    async fn due_queued(&self, now: DateTime<Utc>, limit: u32)
    -> AppResult<Vec<QueuedNotification>>;

    /// Atomically remove a queue item and store its delivered notification.
    ///
    /// Returns `false` if the item was already taken by another sweep.
    async fn promote(&self, item_id: Uuid, notification: &Notification) -> AppResult<bool>;

    /// Push a queue item's next evaluation back.
    async fn reschedule(&self, item_id: Uuid, deliver_after: DateTime<Utc>) -> AppResult<()>;

    /// Drop queue items unsent. Returns how many were removed.
    async fn discard(&self, item_ids: &[Uuid]) -> AppResult<u64>;

    /// Queue items still pending for a user.
    async fn count_queued(&self, user_id: Uuid) -> AppResult<u64>;
}
