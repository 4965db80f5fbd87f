//! Inbox operations on delivered notifications.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_core::error::AppError;
use learnhub_core::events::{Audience, EventPayload, NotificationEvent};
use learnhub_core::types::{PageRequest, PageResponse};
use learnhub_database::store::NotificationStore;
use learnhub_entity::notification::Notification;

use crate::context::RequestContext;
use crate::events::EventSink;

/// Lists, marks, and deletes the caller's notifications.
#[derive(Debug, Clone)]
pub struct NotificationService {
    /// Notification storage.
    store: Arc<dyn NotificationStore>,
    /// Broadcast sink.
    events: EventSink,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(store: Arc<dyn NotificationStore>, events: EventSink) -> Self {
        Self { store, events }
    }

    /// Lists notifications for the current user, newest first.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        unread_only: bool,
        page: PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let page = PageRequest::new(page.page, page.page_size);
        self.store.list(ctx.user_id, unread_only, &page).await
    }

    /// Gets the unread notification count.
    pub async fn unread_count(&self, ctx: &RequestContext) -> AppResult<u64> {
        self.store.count_unread(ctx.user_id).await
    }

    /// Marks a notification as read.
    pub async fn mark_read(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Notification> {
        let n = self.set_read(ctx, id, true).await?;
        self.notify(
            ctx,
            NotificationEvent::Read {
                notification_id: id,
                user_id: ctx.user_id,
            },
        )
        .await;
        Ok(n)
    }

    /// Marks a notification as unread.
    pub async fn mark_unread(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Notification> {
        let n = self.set_read(ctx, id, false).await?;
        self.notify(
            ctx,
            NotificationEvent::Unread {
                notification_id: id,
                user_id: ctx.user_id,
            },
        )
        .await;
        Ok(n)
    }

    /// Marks all notifications as read for the current user.
    pub async fn mark_all_read(&self, ctx: &RequestContext) -> AppResult<u64> {
        let count = self.store.mark_all_read(ctx.user_id, Utc::now()).await?;
        if count > 0 {
            self.notify(
                ctx,
                NotificationEvent::AllRead {
                    user_id: ctx.user_id,
                    count,
                },
            )
            .await;
        }
        Ok(count)
    }

    /// Deletes one of the caller's notifications.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        if !self.store.delete(id, ctx.user_id).await? {
            return Err(AppError::not_found("Notification not found"));
        }
        self.notify(
            ctx,
            NotificationEvent::Deleted {
                notification_id: id,
                user_id: ctx.user_id,
            },
        )
        .await;
        Ok(())
    }

    async fn set_read(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        read: bool,
    ) -> AppResult<Notification> {
        self.store
            .set_read(id, ctx.user_id, read, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("Notification not found"))
    }

    async fn notify(&self, ctx: &RequestContext, event: NotificationEvent) {
        self.events
            .emit(
                Audience::User(ctx.user_id),
                Some(ctx.user_id),
                EventPayload::Notification(event),
            )
            .await;
    }
}
