//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use learnhub_core::error::{AppError, ErrorKind};
use learnhub_core::result::AppResult;
use learnhub_core::types::{PageRequest, PageResponse};
use learnhub_entity::notification::{Notification, QueuedNotification};

use crate::store::NotificationStore;

/// Repository for `notifications` and `notification_queue`.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_notification(
    conn: &mut PgConnection,
    n: &Notification,
) -> AppResult<Notification> {
    sqlx::query_as::<_, Notification>(
        "INSERT INTO notifications \
            (id, user_id, notification_type, category, subcategory, priority, title, message, \
             action_url, payload, is_read, read_at, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *",
    )
    .bind(n.id)
    .bind(n.user_id)
    .bind(&n.notification_type)
    .bind(&n.category)
    .bind(&n.subcategory)
    .bind(n.priority)
    .bind(&n.title)
    .bind(&n.message)
    .bind(n.action_url.as_deref())
    .bind(n.payload.as_ref())
    .bind(n.is_read)
    .bind(n.read_at)
    .bind(n.created_at)
    .fetch_one(conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert(&self, notification: &Notification) -> AppResult<Notification> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })?;
        insert_notification(&mut conn, notification).await
    }

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count notifications", e)
        })?;

        let items = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))?;

        Ok(PageResponse::new(
            items,
            page.page,
            page.page_size,
            total.max(0) as u64,
        ))
    }

    async fn count_unread(&self, user_id: Uuid) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread", e))?;
        Ok(count.max(0) as u64)
    }

    async fn set_read(
        &self,
        id: Uuid,
        user_id: Uuid,
        read: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = $3, \
                read_at = CASE WHEN $3 THEN COALESCE(read_at, $4) ELSE NULL END \
             WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(read)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update read state", e))
    }

    async fn mark_all_read(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $2 \
             WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete notification", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn enqueue(&self, item: &QueuedNotification) -> AppResult<QueuedNotification> {
        sqlx::query_as::<_, QueuedNotification>(
            "INSERT INTO notification_queue \
                (id, user_id, notification_type, subcategory, priority, title, message, \
                 action_url, payload, deliver_after, expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(item.id)
        .bind(item.user_id)
        .bind(&item.notification_type)
        .bind(&item.subcategory)
        .bind(item.priority)
        .bind(&item.title)
        .bind(&item.message)
        .bind(item.action_url.as_deref())
        .bind(item.payload.as_ref())
        .bind(item.deliver_after)
        .bind(item.expires_at)
        .bind(item.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to queue notification", e))
    }

    async fn due_queued(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<QueuedNotification>> {
        sqlx::query_as::<_, QueuedNotification>(
            "SELECT * FROM notification_queue \
             WHERE deliver_after <= $1 OR expires_at <= $1 \
             ORDER BY created_at ASC LIMIT $2",
        )
        .bind(now)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load due queue items", e))
    }

    async fn promote(&self, item_id: Uuid, notification: &Notification) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin promotion", e)
        })?;

        let taken = sqlx::query("DELETE FROM notification_queue WHERE id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim queue item", e))?
            .rows_affected();
        if taken == 0 {
            return Ok(false);
        }

        insert_notification(&mut tx, notification).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit promotion", e)
        })?;
        Ok(true)
    }

    async fn reschedule(&self, item_id: Uuid, deliver_after: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE notification_queue SET deliver_after = $2 WHERE id = $1")
            .bind(item_id)
            .bind(deliver_after)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to reschedule queue item", e)
            })?;
        Ok(())
    }

    async fn discard(&self, item_ids: &[Uuid]) -> AppResult<u64> {
        if item_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM notification_queue WHERE id = ANY($1)")
            .bind(item_ids)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to discard queue items", e)
            })?;
        Ok(result.rows_affected())
    }

    async fn count_queued(&self, user_id: Uuid) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notification_queue WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count queue items", e)
                })?;
        Ok(count.max(0) as u64)
    }
}
