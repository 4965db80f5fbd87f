//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use learnhub_entity::notification::{
    NewNotification, NotificationPriority, NotificationSubcategory,
};
use learnhub_entity::presence::PresenceStatus;
use learnhub_service::live_session::CreateLiveSession;
use learnhub_service::office_hours::CreateSchedule;

/// Status change.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetStatusRequest {
    /// New status.
    pub status: PresenceStatus,
    /// Free-text activity; blank clears it.
    #[validate(length(max = 200, message = "Activity must be at most 200 characters"))]
    pub activity: Option<String>,
}

/// Batch presence lookup.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchPresenceRequest {
    /// Users to look up. Order of the reply follows this list.
    #[validate(length(min = 1, message = "At least one user id is required"))]
    pub user_ids: Vec<Uuid>,
}

/// `?limit=` on the online list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnlineQuery {
    /// Maximum number of records.
    pub limit: Option<u32>,
}

/// New office-hours schedule.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    /// Display title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Course the hours belong to.
    pub course_id: Option<Uuid>,
    /// Planned opening.
    pub starts_at: Option<DateTime<Utc>>,
    /// Planned closing.
    pub ends_at: Option<DateTime<Utc>>,
}

impl From<CreateScheduleRequest> for CreateSchedule {
    fn from(req: CreateScheduleRequest) -> Self {
        Self {
            title: req.title,
            course_id: req.course_id,
            starts_at: req.starts_at,
            ends_at: req.ends_at,
        }
    }
}

/// Join an office-hours queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct JoinQueueRequest {
    /// What the student wants to ask.
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub question: Option<String>,
}

/// New live session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSessionRequest {
    /// Display title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Seats.
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: u32,
    /// Planned start.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Course the session belongs to.
    pub course_id: Option<Uuid>,
}

impl From<CreateSessionRequest> for CreateLiveSession {
    fn from(req: CreateSessionRequest) -> Self {
        Self {
            title: req.title,
            capacity: req.capacity,
            scheduled_at: req.scheduled_at,
            course_id: req.course_id,
        }
    }
}

/// Capacity edit.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCapacityRequest {
    /// New seat count.
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: u32,
}

/// Producer request to notify one user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PublishNotificationRequest {
    /// Recipient.
    pub user_id: Uuid,
    /// Producer-defined type ("assessment.graded").
    #[validate(length(min = 1, max = 100))]
    pub notification_type: String,
    /// Subcategory; its category is implied.
    pub subcategory: NotificationSubcategory,
    /// Priority.
    #[serde(default)]
    pub priority: NotificationPriority,
    /// Title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Body.
    #[validate(length(min = 1, max = 4000))]
    pub message: String,
    /// Optional deep link.
    #[validate(url)]
    pub action_url: Option<String>,
    /// Additional structured data.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

impl From<PublishNotificationRequest> for NewNotification {
    fn from(req: PublishNotificationRequest) -> Self {
        Self {
            user_id: req.user_id,
            notification_type: req.notification_type,
            subcategory: req.subcategory,
            priority: req.priority,
            title: req.title,
            message: req.message,
            action_url: req.action_url,
            payload: req.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_fails_validation() {
        let req = CreateSessionRequest {
            title: "Office chat".to_string(),
            capacity: 0,
            scheduled_at: None,
            course_id: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_publish_request_parses_snake_case_subcategory() {
        let req: PublishNotificationRequest = serde_json::from_value(serde_json::json!({
            "user_id": Uuid::new_v4(),
            "notification_type": "discussion.reply",
            "subcategory": "discussion_reply",
            "title": "New reply",
            "message": "Someone answered your question"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.priority, NotificationPriority::Normal);
        let new: NewNotification = req.into();
        assert_eq!(new.subcategory, NotificationSubcategory::DiscussionReply);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let req = BatchPresenceRequest { user_ids: vec![] };
        assert!(req.validate().is_err());
    }
}
