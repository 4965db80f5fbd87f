//! In-memory notification store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_core::types::{PageRequest, PageResponse};
use learnhub_entity::notification::{Notification, QueuedNotification};

use crate::store::NotificationStore;

/// Inbox rows and quiet-hours queue items.
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    inbox: DashMap<Uuid, Notification>,
    queue: DashMap<Uuid, QueuedNotification>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> AppResult<Notification> {
        self.inbox.insert(notification.id, notification.clone());
        Ok(notification.clone())
    }

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let mut matching: Vec<Notification> = self
            .inbox
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .map(|n| n.clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn count_unread(&self, user_id: Uuid) -> AppResult<u64> {
        Ok(self
            .inbox
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as u64)
    }

    async fn set_read(
        &self,
        id: Uuid,
        user_id: Uuid,
        read: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        Ok(self
            .inbox
            .get_mut(&id)
            .filter(|n| n.user_id == user_id)
            .map(|mut n| {
                n.is_read = read;
                n.read_at = if read { n.read_at.or(Some(now)) } else { None };
                n.clone()
            }))
    }

    async fn mark_all_read(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let mut changed = 0;
        for mut n in self.inbox.iter_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                n.read_at = Some(now);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self
            .inbox
            .remove_if(&id, |_, n| n.user_id == user_id)
            .is_some())
    }

    async fn enqueue(&self, item: &QueuedNotification) -> AppResult<QueuedNotification> {
        self.queue.insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn due_queued(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<QueuedNotification>> {
        let mut due: Vec<QueuedNotification> = self
            .queue
            .iter()
            .filter(|q| q.deliver_after <= now || q.is_expired(now))
            .map(|q| q.clone())
            .collect();
        due.sort_by_key(|q| q.created_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn promote(&self, item_id: Uuid, notification: &Notification) -> AppResult<bool> {
        if self.queue.remove(&item_id).is_none() {
            return Ok(false);
        }
        self.inbox.insert(notification.id, notification.clone());
        Ok(true)
    }

    async fn reschedule(&self, item_id: Uuid, deliver_after: DateTime<Utc>) -> AppResult<()> {
        if let Some(mut item) = self.queue.get_mut(&item_id) {
            item.deliver_after = deliver_after;
        }
        Ok(())
    }

    async fn discard(&self, item_ids: &[Uuid]) -> AppResult<u64> {
        Ok(item_ids
            .iter()
            .filter(|id| self.queue.remove(*id).is_some())
            .count() as u64)
    }

    async fn count_queued(&self, user_id: Uuid) -> AppResult<u64> {
        Ok(self.queue.iter().filter(|q| q.user_id == user_id).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use learnhub_entity::notification::{
        NewNotification, NotificationPriority, NotificationSubcategory,
    };

    fn new_for(user_id: Uuid) -> NewNotification {
        NewNotification {
            user_id,
            notification_type: "assessment.graded".to_string(),
            subcategory: NotificationSubcategory::AssessmentGraded,
            priority: NotificationPriority::Normal,
            title: "Quiz graded".to_string(),
            message: "You scored 9/10".to_string(),
            action_url: None,
            payload: None,
        }
    }

    #[tokio::test]
    async fn test_list_pages_newest_first_and_filters_unread() {
        let store = MemoryNotificationStore::new();
        let user = Uuid::new_v4();
        let t0 = Utc::now();
        for i in 0..3 {
            let n = Notification::from_new(new_for(user), t0 + Duration::seconds(i));
            store.insert(&n).await.unwrap();
        }
        let page = store
            .list(user, false, &PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total_items, 3);
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].created_at > page.items[1].created_at);

        let newest = page.items[0].id;
        store.set_read(newest, user, true, t0).await.unwrap();
        let unread = store
            .list(user, true, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(unread.total_items, 2);
        assert!(unread.items.iter().all(|n| n.id != newest));
    }

    #[tokio::test]
    async fn test_other_users_rows_are_invisible() {
        let store = MemoryNotificationStore::new();
        let owner = Uuid::new_v4();
        let n = store
            .insert(&Notification::from_new(new_for(owner), Utc::now()))
            .await
            .unwrap();
        let stranger = Uuid::new_v4();
        assert!(store.set_read(n.id, stranger, true, Utc::now()).await.unwrap().is_none());
        assert!(!store.delete(n.id, stranger).await.unwrap());
        assert!(store.delete(n.id, owner).await.unwrap());
    }

    #[tokio::test]
    async fn test_promote_claims_item_once() {
        let store = MemoryNotificationStore::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        let item = QueuedNotification::defer(new_for(user), now, now + Duration::hours(24), now);
        store.enqueue(&item).await.unwrap();

        let n = Notification::from_new(item.to_new().unwrap(), now);
        assert!(store.promote(item.id, &n).await.unwrap());
        assert!(!store.promote(item.id, &n).await.unwrap());
        assert_eq!(store.count_unread(user).await.unwrap(), 1);
        assert_eq!(store.count_queued(user).await.unwrap(), 0);
    }
}
