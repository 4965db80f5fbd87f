//! Office-hours queue service.
//!
//! Joins go through the store's admission path with an unbounded capacity:
//! the queue has no size limit, only the one-active-entry-per-pair rule.
//! Positions are computed from the store on every read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use learnhub_core::AppResult;
use learnhub_core::error::AppError;
use learnhub_core::events::{Audience, EventPayload, OfficeHoursEvent, QueueChange, Room};
use learnhub_core::types::AdmissionOutcome;
use learnhub_database::store::{NewQueueEntry, OfficeHoursStore};
use learnhub_entity::office_hours::{OfficeHoursSchedule, QueueEntry, QueueEntryStatus};

use crate::context::RequestContext;
use crate::events::EventSink;

/// Longest question text accepted on join.
const MAX_QUESTION_LEN: usize = 2000;

/// Input for creating a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSchedule {
    /// Display title.
    pub title: String,
    /// Course the hours belong to.
    pub course_id: Option<Uuid>,
    /// Planned opening.
    pub starts_at: Option<DateTime<Utc>>,
    /// Planned closing.
    pub ends_at: Option<DateTime<Utc>>,
}

/// A successful join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueJoin {
    /// The new entry.
    pub entry: QueueEntry,
    /// 1-based FIFO position at the time of the join.
    pub position: u32,
}

/// An active entry with its live position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueView {
    /// The entry.
    #[serde(flatten)]
    pub entry: QueueEntry,
    /// Set while the entry is waiting.
    pub position: Option<u32>,
}

/// Runs office-hours schedules and queues.
#[derive(Debug, Clone)]
pub struct OfficeHoursService {
    /// Schedule and queue storage.
    store: Arc<dyn OfficeHoursStore>,
    /// Broadcast sink.
    events: EventSink,
}

impl OfficeHoursService {
    /// Creates a new office-hours service.
    pub fn new(store: Arc<dyn OfficeHoursStore>, events: EventSink) -> Self {
        Self { store, events }
    }

    /// Create an open schedule owned by the caller.
    pub async fn create_schedule(
        &self,
        ctx: &RequestContext,
        input: CreateSchedule,
    ) -> AppResult<OfficeHoursSchedule> {
        ctx.require_host()?;
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Schedule title is required"));
        }
        if let (Some(start), Some(end)) = (input.starts_at, input.ends_at) {
            if end <= start {
                return Err(AppError::validation("Schedule must end after it starts"));
            }
        }

        let schedule = OfficeHoursSchedule {
            id: Uuid::new_v4(),
            instructor_id: ctx.user_id,
            course_id: input.course_id,
            title: title.to_string(),
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            is_open: true,
            created_at: Utc::now(),
        };
        let created = self.store.create_schedule(&schedule).await?;
        info!(schedule_id = %created.id, instructor_id = %ctx.user_id, "Office hours scheduled");
        Ok(created)
    }

    /// Open or close a schedule for joins. Existing entries are unaffected.
    pub async fn set_open(
        &self,
        ctx: &RequestContext,
        schedule_id: Uuid,
        is_open: bool,
    ) -> AppResult<OfficeHoursSchedule> {
        let schedule = self.schedule(schedule_id).await?;
        ctx.require_owner(schedule.instructor_id, "schedule")?;
        self.store
            .set_schedule_open(schedule_id, is_open)
            .await?
            .ok_or_else(|| AppError::not_found("Office hours schedule not found"))
    }

    /// Join the queue behind the schedule's instructor.
    pub async fn join(
        &self,
        ctx: &RequestContext,
        schedule_id: Uuid,
        question: Option<String>,
    ) -> AppResult<QueueJoin> {
        let question = normalize_question(question)?;
        let outcome = self
            .store
            .join(NewQueueEntry {
                schedule_id,
                student_id: ctx.user_id,
                question,
            })
            .await?;

        let entry = match outcome {
            AdmissionOutcome::Admitted {
                already_present: true,
                ..
            } => return Err(AppError::conflict("Already in this instructor's queue")),
            AdmissionOutcome::Admitted { occupant, .. } => occupant,
            AdmissionOutcome::Denied { reason, .. } => {
                return Err(reason.into_error("Office hours"));
            }
        };

        let position = self.position_of(&entry).await?;
        info!(
            entry_id = %entry.id,
            instructor_id = %entry.instructor_id,
            student_id = %entry.student_id,
            position,
            "Joined office-hours queue"
        );
        self.announce(&entry, QueueChange::Joined, ctx.user_id).await;
        Ok(QueueJoin { entry, position })
    }

    /// FIFO position of a waiting entry. Visible to the student and the instructor.
    pub async fn position(&self, ctx: &RequestContext, entry_id: Uuid) -> AppResult<u32> {
        let entry = self.entry(entry_id).await?;
        if !entry.involves(ctx.user_id) {
            return Err(AppError::authorization("Not your queue entry"));
        }
        if entry.status != QueueEntryStatus::Waiting {
            return Err(AppError::not_found("Queue entry is no longer waiting"));
        }
        self.position_of(&entry).await
    }

    /// Move a waiting entry to admitted. Instructor only.
    pub async fn admit(&self, ctx: &RequestContext, entry_id: Uuid) -> AppResult<QueueEntry> {
        let entry = self.entry(entry_id).await?;
        ctx.require_owner(entry.instructor_id, "queue")?;
        self.apply(ctx, entry, QueueEntryStatus::Admitted).await
    }

    /// Move an admitted entry to completed. Instructor only.
    pub async fn complete(&self, ctx: &RequestContext, entry_id: Uuid) -> AppResult<QueueEntry> {
        let entry = self.entry(entry_id).await?;
        ctx.require_owner(entry.instructor_id, "queue")?;
        self.apply(ctx, entry, QueueEntryStatus::Completed).await
    }

    /// Cancel a waiting or admitted entry. Either party may cancel.
    pub async fn cancel(&self, ctx: &RequestContext, entry_id: Uuid) -> AppResult<QueueEntry> {
        let entry = self.entry(entry_id).await?;
        if !entry.involves(ctx.user_id) {
            return Err(AppError::authorization(
                "Only the student or the instructor can cancel this entry",
            ));
        }
        self.apply(ctx, entry, QueueEntryStatus::Cancelled).await
    }

    /// Waiting and admitted entries for an instructor, in FIFO order.
    pub async fn list_queue(&self, instructor_id: Uuid) -> AppResult<Vec<QueueView>> {
        let entries = self.store.list_active(instructor_id).await?;
        Ok(with_positions(entries))
    }

    /// The caller's own active entries, each with its position.
    pub async fn my_entries(&self, ctx: &RequestContext) -> AppResult<Vec<QueueView>> {
        let entries = self.store.list_for_student(ctx.user_id).await?;
        let mut views = Vec::with_capacity(entries.len());
        for entry in entries {
            let position = match entry.status {
                QueueEntryStatus::Waiting => Some(self.position_of(&entry).await?),
                _ => None,
            };
            views.push(QueueView { entry, position });
        }
        Ok(views)
    }

    async fn apply(
        &self,
        ctx: &RequestContext,
        entry: QueueEntry,
        next: QueueEntryStatus,
    ) -> AppResult<QueueEntry> {
        let updated = self
            .store
            .transition(entry.id, next, ctx.user_id, Utc::now())
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Queue entry cannot move from {} to {}",
                    entry.status.as_str(),
                    next.as_str()
                ))
            })?;

        let change = match next {
            QueueEntryStatus::Admitted => QueueChange::Admitted,
            QueueEntryStatus::Completed => QueueChange::Completed,
            QueueEntryStatus::Cancelled => QueueChange::Cancelled,
            QueueEntryStatus::Waiting => QueueChange::Joined,
        };
        info!(
            entry_id = %updated.id,
            instructor_id = %updated.instructor_id,
            status = updated.status.as_str(),
            actor_id = %ctx.user_id,
            "Queue entry transitioned"
        );
        self.announce(&updated, change, ctx.user_id).await;
        if entry.status == QueueEntryStatus::Waiting {
            self.announce_positions(&updated, ctx.user_id).await;
        }
        Ok(updated)
    }

    /// Tell every student still waiting behind `left` their new position.
    async fn announce_positions(&self, left: &QueueEntry, actor_id: Uuid) {
        let entries = match self.store.list_active(left.instructor_id).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(instructor_id = %left.instructor_id, error = %e, "Could not list queue for positions");
                return;
            }
        };
        for view in with_positions(entries) {
            let Some(position) = view.position else {
                continue;
            };
            if view.entry.joined_at <= left.joined_at {
                continue;
            }
            self.events
                .emit(
                    Audience::User(view.entry.student_id),
                    Some(actor_id),
                    EventPayload::OfficeHours(OfficeHoursEvent::PositionChanged {
                        entry_id: view.entry.id,
                        instructor_id: view.entry.instructor_id,
                        student_id: view.entry.student_id,
                        position,
                    }),
                )
                .await;
        }
    }

    /// Room event for the queue view, then the targeted event for the student.
    async fn announce(&self, entry: &QueueEntry, change: QueueChange, actor_id: Uuid) {
        let waiting_count = match self.store.count_waiting(entry.instructor_id).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(instructor_id = %entry.instructor_id, error = %e, "Could not count waiting entries");
                0
            }
        };
        self.events
            .emit(
                Audience::Room(Room::OfficeHoursQueue(entry.instructor_id)),
                Some(actor_id),
                EventPayload::OfficeHours(OfficeHoursEvent::QueueUpdated {
                    instructor_id: entry.instructor_id,
                    entry_id: entry.id,
                    student_id: entry.student_id,
                    change,
                    waiting_count,
                }),
            )
            .await;

        let targeted = match change {
            QueueChange::Joined => None,
            QueueChange::Admitted => Some(OfficeHoursEvent::Admitted {
                entry_id: entry.id,
                instructor_id: entry.instructor_id,
                student_id: entry.student_id,
            }),
            QueueChange::Completed => Some(OfficeHoursEvent::Completed {
                entry_id: entry.id,
                instructor_id: entry.instructor_id,
                student_id: entry.student_id,
            }),
            QueueChange::Cancelled => Some(OfficeHoursEvent::Cancelled {
                entry_id: entry.id,
                instructor_id: entry.instructor_id,
                student_id: entry.student_id,
                cancelled_by: actor_id,
            }),
        };
        if let Some(event) = targeted {
            self.events
                .emit(
                    Audience::User(entry.student_id),
                    Some(actor_id),
                    EventPayload::OfficeHours(event),
                )
                .await;
        }
    }

    async fn position_of(&self, entry: &QueueEntry) -> AppResult<u32> {
        let ahead = self
            .store
            .count_waiting_before(entry.instructor_id, entry.joined_at)
            .await?;
        Ok(ahead + 1)
    }

    async fn schedule(&self, id: Uuid) -> AppResult<OfficeHoursSchedule> {
        self.store
            .find_schedule(id)
            .await?
            .ok_or_else(|| AppError::not_found("Office hours schedule not found"))
    }

    async fn entry(&self, id: Uuid) -> AppResult<QueueEntry> {
        self.store
            .find_entry(id)
            .await?
            .ok_or_else(|| AppError::not_found("Queue entry not found"))
    }
}

/// Number the waiting entries 1.. in join order. Ties share a position.
fn with_positions(entries: Vec<QueueEntry>) -> Vec<QueueView> {
    let waiting: Vec<DateTime<Utc>> = entries
        .iter()
        .filter(|e| e.status == QueueEntryStatus::Waiting)
        .map(|e| e.joined_at)
        .collect();
    entries
        .into_iter()
        .map(|entry| {
            let position = (entry.status == QueueEntryStatus::Waiting).then(|| {
                let ahead = waiting.iter().filter(|t| **t < entry.joined_at).count();
                u32::try_from(ahead).unwrap_or(u32::MAX).saturating_add(1)
            });
            QueueView { entry, position }
        })
        .collect()
}

fn normalize_question(question: Option<String>) -> AppResult<Option<String>> {
    match question.map(|q| q.trim().to_string()) {
        Some(q) if q.is_empty() => Ok(None),
        Some(q) if q.chars().count() > MAX_QUESTION_LEN => Err(AppError::validation(format!(
            "Question must be at most {MAX_QUESTION_LEN} characters"
        ))),
        other => Ok(other),
    }
}
