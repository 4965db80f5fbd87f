//! Notification fan-out.
//!
//! `publish` resolves the recipient's policy, then either writes an inbox
//! row and pushes it, or defers it to the quiet-hours queue. The queue sweep
//! promotes deferred items once the recipient's window has closed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_core::config::NotificationConfig;
use learnhub_core::error::AppError;
use learnhub_core::events::{Audience, EventPayload, NotificationEvent};
use learnhub_database::store::NotificationStore;
use learnhub_entity::notification::{
    NewNotification, Notification, PreferenceSettings, QueuedNotification,
};

use super::policy::DeliveryDecision;
use super::preferences::PreferenceService;
use crate::email::{EmailContent, EmailSender};
use crate::events::EventSink;

/// What happened on the in-app channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum InAppDelivery {
    /// Written and pushed.
    Delivered(Notification),
    /// Queued until quiet hours end.
    Deferred(QueuedNotification),
    /// The channel resolved off.
    Skipped,
}

/// Result of one `publish`.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    /// The resolved policy.
    pub decision: DeliveryDecision,
    /// In-app result.
    pub in_app: InAppDelivery,
    /// The email relay accepted the message.
    pub emailed: bool,
}

/// Counts from one queue sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueSweepReport {
    /// Items moved to the inbox.
    pub promoted: usize,
    /// Items pushed back because quiet hours are still on.
    pub rescheduled: usize,
    /// Items dropped: expired, unreadable, or no longer wanted.
    pub discarded: u64,
}

/// Delivers notifications according to each recipient's preferences.
#[derive(Debug, Clone)]
pub struct NotificationFanout {
    /// Inbox and deferred-queue storage.
    notifications: Arc<dyn NotificationStore>,
    /// Preference lookups.
    preferences: PreferenceService,
    /// Email relay.
    email: Arc<dyn EmailSender>,
    /// Broadcast sink.
    events: EventSink,
    /// Queue TTL and sweep batch size.
    config: NotificationConfig,
}

impl NotificationFanout {
    /// Creates a new fan-out.
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        preferences: PreferenceService,
        email: Arc<dyn EmailSender>,
        events: EventSink,
        config: NotificationConfig,
    ) -> Self {
        Self {
            notifications,
            preferences,
            email,
            events,
            config,
        }
    }

    /// Deliver a notification now.
    pub async fn publish(&self, new: NewNotification) -> AppResult<PublishOutcome> {
        self.publish_at(new, Utc::now()).await
    }

    /// Deliver a notification as of `now`.
    pub async fn publish_at(
        &self,
        new: NewNotification,
        now: DateTime<Utc>,
    ) -> AppResult<PublishOutcome> {
        validate(&new)?;
        let settings = self.preferences.settings_for(new.user_id).await?;
        let decision = DeliveryDecision::resolve(&settings, new.subcategory);

        if decision.is_suppressed() {
            debug!(
                user_id = %new.user_id,
                subcategory = new.subcategory.as_str(),
                "Notification suppressed by preferences"
            );
            return Ok(PublishOutcome {
                decision,
                in_app: InAppDelivery::Skipped,
                emailed: false,
            });
        }

        let emailed = if decision.email {
            self.send_email(&new, &settings).await
        } else {
            false
        };

        let in_app = if decision.in_app {
            self.deliver_in_app(new, &settings, now).await?
        } else {
            InAppDelivery::Skipped
        };

        Ok(PublishOutcome {
            decision,
            in_app,
            emailed,
        })
    }

    async fn deliver_in_app(
        &self,
        new: NewNotification,
        settings: &PreferenceSettings,
        now: DateTime<Utc>,
    ) -> AppResult<InAppDelivery> {
        if let Some(deliver_after) = settings.quiet_hours.and_then(|q| q.window_end(now)) {
            let expires_at = now + Duration::hours(i64::from(self.config.queued_ttl_hours));
            let item = QueuedNotification::defer(new, deliver_after, expires_at, now);
            let item = self.notifications.enqueue(&item).await?;
            debug!(
                user_id = %item.user_id,
                item_id = %item.id,
                deliver_after = %item.deliver_after,
                "Notification deferred for quiet hours"
            );
            return Ok(InAppDelivery::Deferred(item));
        }

        let notification = self
            .notifications
            .insert(&Notification::from_new(new, now))
            .await?;
        self.push_created(&notification).await;
        Ok(InAppDelivery::Delivered(notification))
    }

    async fn send_email(&self, new: &NewNotification, settings: &PreferenceSettings) -> bool {
        let content = EmailContent {
            subject: new.title.clone(),
            body: new.message.clone(),
            action_url: new.action_url.clone(),
            digest: settings.global.digest,
        };
        match self.email.send(new.user_id, &content).await {
            Ok(()) => true,
            Err(e) => {
                warn!(user_id = %new.user_id, error = %e, "Email delivery failed");
                false
            }
        }
    }

    /// Promote due deferred items, reschedule those still in quiet hours,
    /// and drop expired ones.
    pub async fn sweep_queue(&self, now: DateTime<Utc>) -> AppResult<QueueSweepReport> {
        let due = self
            .notifications
            .due_queued(now, self.config.sweep_batch_size)
            .await?;

        let mut report = QueueSweepReport::default();
        let mut dropped: Vec<Uuid> = Vec::new();

        for item in due {
            if item.is_expired(now) {
                dropped.push(item.id);
                continue;
            }

            // Preferences are read fresh: the window may have moved since deferral.
            let settings = self.preferences.settings_for(item.user_id).await?;
            if let Some(window_end) = settings.quiet_hours.and_then(|q| q.window_end(now)) {
                self.notifications.reschedule(item.id, window_end).await?;
                report.rescheduled += 1;
                continue;
            }

            let new = match item.to_new() {
                Ok(new) => new,
                Err(e) => {
                    warn!(item_id = %item.id, error = %e, "Unreadable queued notification dropped");
                    dropped.push(item.id);
                    continue;
                }
            };
            if !DeliveryDecision::resolve(&settings, new.subcategory).in_app {
                dropped.push(item.id);
                continue;
            }

            let notification = Notification::from_new(new, now);
            if self.notifications.promote(item.id, &notification).await? {
                self.push_created(&notification).await;
                report.promoted += 1;
            }
        }

        report.discarded = self.notifications.discard(&dropped).await?;
        if report != QueueSweepReport::default() {
            info!(
                promoted = report.promoted,
                rescheduled = report.rescheduled,
                discarded = report.discarded,
                "Notification queue swept"
            );
        }
        Ok(report)
    }

    async fn push_created(&self, n: &Notification) {
        self.events
            .emit(
                Audience::User(n.user_id),
                None,
                EventPayload::Notification(NotificationEvent::Created {
                    notification_id: n.id,
                    user_id: n.user_id,
                    notification_type: n.notification_type.clone(),
                    category: n.category.clone(),
                    subcategory: n.subcategory.clone(),
                    priority: n.priority.as_str().to_string(),
                    title: n.title.clone(),
                    message: n.message.clone(),
                    action_url: n.action_url.clone(),
                    created_at: n.created_at,
                }),
            )
            .await;
    }
}

fn validate(new: &NewNotification) -> AppResult<()> {
    if new.notification_type.trim().is_empty() {
        return Err(AppError::validation("Notification type is required"));
    }
    if new.title.trim().is_empty() {
        return Err(AppError::validation("Notification title is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingEmail, RecordingPublisher};
    use chrono::{NaiveTime, TimeZone};
    use learnhub_core::error::ErrorKind;
    use learnhub_database::memory::{MemoryNotificationStore, MemoryPreferenceStore};
    use learnhub_entity::notification::{
        ChannelOverrides, NotificationPriority, NotificationSubcategory, QuietHours, TriState,
    };

    struct Fixture {
        fanout: NotificationFanout,
        store: Arc<MemoryNotificationStore>,
        prefs: PreferenceService,
        email: Arc<RecordingEmail>,
        recorder: Arc<RecordingPublisher>,
    }

    fn fixture_with(email: RecordingEmail) -> Fixture {
        let (recorder, sink) = RecordingPublisher::sink();
        let store = Arc::new(MemoryNotificationStore::new());
        let prefs = PreferenceService::new(Arc::new(MemoryPreferenceStore::new()));
        let email = Arc::new(email);
        let fanout = NotificationFanout::new(
            store.clone(),
            prefs.clone(),
            email.clone(),
            sink,
            NotificationConfig::default(),
        );
        Fixture {
            fanout,
            store,
            prefs,
            email,
            recorder,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingEmail::default())
    }

    fn new_for(user_id: Uuid, subcategory: NotificationSubcategory) -> NewNotification {
        NewNotification {
            user_id,
            notification_type: "lesson.completed".to_string(),
            subcategory,
            priority: NotificationPriority::Normal,
            title: "Lesson complete".to_string(),
            message: "You finished lesson 4".to_string(),
            action_url: None,
            payload: None,
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    fn night() -> QuietHours {
        QuietHours {
            start: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            utc_offset_minutes: 0,
        }
    }

    async fn with_quiet_hours(f: &Fixture, user: Uuid) {
        let settings = PreferenceSettings {
            quiet_hours: Some(night()),
            ..PreferenceSettings::default()
        };
        f.prefs.update(user, settings).await.unwrap();
    }

    #[tokio::test]
    async fn test_default_preferences_deliver_and_push() {
        let f = fixture();
        let user = Uuid::new_v4();
        let outcome = f
            .fanout
            .publish(new_for(user, NotificationSubcategory::LessonCompletion))
            .await
            .unwrap();

        assert!(matches!(outcome.in_app, InAppDelivery::Delivered(_)));
        assert!(outcome.emailed);
        assert_eq!(f.store.count_unread(user).await.unwrap(), 1);
        assert_eq!(
            f.recorder.sent_to(Audience::User(user)),
            vec!["notification_created"]
        );
        assert_eq!(f.email.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fully_suppressed_writes_nothing() {
        let f = fixture();
        let user = Uuid::new_v4();
        let mut settings = PreferenceSettings::default();
        settings.global.in_app_enabled = false;
        settings.global.email_enabled = false;
        f.prefs.update(user, settings).await.unwrap();

        let outcome = f
            .fanout
            .publish(new_for(user, NotificationSubcategory::CourseAnnouncement))
            .await
            .unwrap();

        assert!(outcome.decision.is_suppressed());
        assert_eq!(f.store.count_unread(user).await.unwrap(), 0);
        assert_eq!(f.store.count_queued(user).await.unwrap(), 0);
        assert!(f.recorder.names().is_empty());
        assert!(f.email.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_email_only_skips_inbox() {
        let f = fixture();
        let user = Uuid::new_v4();
        let mut settings = PreferenceSettings::default();
        settings.subcategories.insert(
            NotificationSubcategory::AssessmentDue,
            ChannelOverrides {
                in_app: TriState::ForceOff,
                email: TriState::Inherit,
            },
        );
        f.prefs.update(user, settings).await.unwrap();

        let outcome = f
            .fanout
            .publish(new_for(user, NotificationSubcategory::AssessmentDue))
            .await
            .unwrap();
        assert!(matches!(outcome.in_app, InAppDelivery::Skipped));
        assert!(outcome.emailed);
        assert_eq!(f.store.count_unread(user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_quiet_hours_defer_then_sweep_promotes() {
        let f = fixture();
        let user = Uuid::new_v4();
        with_quiet_hours(&f, user).await;

        let outcome = f
            .fanout
            .publish_at(new_for(user, NotificationSubcategory::LessonCompletion), at(23, 0))
            .await
            .unwrap();
        let InAppDelivery::Deferred(item) = outcome.in_app else {
            panic!("expected deferral, got {:?}", outcome.in_app);
        };
        assert_eq!(item.deliver_after, at(7, 0) + Duration::days(1));
        assert_eq!(item.expires_at, at(23, 0) + Duration::hours(24));
        assert!(f.recorder.names().is_empty());

        // Not due yet.
        let early = f.fanout.sweep_queue(at(23, 30)).await.unwrap();
        assert_eq!(early, QueueSweepReport::default());

        let morning = at(7, 5) + Duration::days(1);
        let report = f.fanout.sweep_queue(morning).await.unwrap();
        assert_eq!(report.promoted, 1);
        assert_eq!(f.store.count_unread(user).await.unwrap(), 1);
        assert_eq!(f.store.count_queued(user).await.unwrap(), 0);
        assert_eq!(
            f.recorder.sent_to(Audience::User(user)),
            vec!["notification_created"]
        );
    }

    #[tokio::test]
    async fn test_sweep_respects_moved_window() {
        let f = fixture();
        let user = Uuid::new_v4();
        with_quiet_hours(&f, user).await;
        f.fanout
            .publish_at(new_for(user, NotificationSubcategory::NewContent), at(23, 0))
            .await
            .unwrap();

        // The user extends quiet hours to 09:00 before the original window ends.
        let mut extended = night();
        extended.end = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let settings = PreferenceSettings {
            quiet_hours: Some(extended),
            ..PreferenceSettings::default()
        };
        f.prefs.update(user, settings).await.unwrap();

        let next_morning = at(7, 5) + Duration::days(1);
        let report = f.fanout.sweep_queue(next_morning).await.unwrap();
        assert_eq!(report.rescheduled, 1);
        assert_eq!(f.store.count_unread(user).await.unwrap(), 0);

        let later = at(9, 1) + Duration::days(1);
        assert_eq!(f.fanout.sweep_queue(later).await.unwrap().promoted, 1);
    }

    #[tokio::test]
    async fn test_expired_items_discarded_unsent() {
        let f = fixture();
        let user = Uuid::new_v4();
        with_quiet_hours(&f, user).await;
        f.fanout
            .publish_at(new_for(user, NotificationSubcategory::Mention), at(23, 0))
            .await
            .unwrap();

        let too_late = at(23, 0) + Duration::hours(25);
        let report = f.fanout.sweep_queue(too_late).await.unwrap();
        assert_eq!(report.discarded, 1);
        assert_eq!(report.promoted, 0);
        assert_eq!(f.store.count_queued(user).await.unwrap(), 0);
        assert_eq!(f.store.count_unread(user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_email_failure_does_not_block_in_app() {
        let f = fixture_with(RecordingEmail {
            fail: true,
            ..RecordingEmail::default()
        });
        let user = Uuid::new_v4();
        let outcome = f
            .fanout
            .publish(new_for(user, NotificationSubcategory::DirectMessage))
            .await
            .unwrap();
        assert!(!outcome.emailed);
        assert!(matches!(outcome.in_app, InAppDelivery::Delivered(_)));
    }

    #[tokio::test]
    async fn test_blank_title_rejected() {
        let f = fixture();
        let mut new = new_for(Uuid::new_v4(), NotificationSubcategory::Maintenance);
        new.title = "   ".to_string();
        let err = f.fanout.publish(new).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
