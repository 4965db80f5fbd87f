//! Notification categories, subcategories, and delivery channels.

use serde::{Deserialize, Serialize};

/// Top-level preference grouping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Learning progress updates.
    Progress,
    /// Course content and scheduling.
    Course,
    /// Quizzes, assignments, grades.
    Assessment,
    /// Discussions and messages.
    Community,
    /// Account and platform notices.
    System,
}

impl NotificationCategory {
    /// Every category.
    pub const ALL: [NotificationCategory; 5] = [
        Self::Progress,
        Self::Course,
        Self::Assessment,
        Self::Community,
        Self::System,
    ];

    /// Return the category as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Progress => "progress",
            Self::Course => "course",
            Self::Assessment => "assessment",
            Self::Community => "community",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fine-grained notification kind. Each belongs to exactly one category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSubcategory {
    /// A lesson was completed.
    LessonCompletion,
    /// A course milestone was reached.
    CourseMilestone,
    /// A learning streak is about to lapse.
    StreakReminder,
    /// New lessons or materials were published.
    NewContent,
    /// The instructor posted an announcement.
    CourseAnnouncement,
    /// A live session starts soon.
    LiveSessionReminder,
    /// Office-hours queue movement.
    OfficeHoursUpdate,
    /// A submission was graded.
    AssessmentGraded,
    /// A deadline is near.
    AssessmentDue,
    /// Someone replied in a discussion.
    DiscussionReply,
    /// Someone mentioned the user.
    Mention,
    /// A direct message arrived.
    DirectMessage,
    /// Sign-in from a new device, password change, and similar.
    SecurityAlert,
    /// Profile or billing account changes.
    AccountUpdate,
    /// Planned downtime.
    Maintenance,
}

impl NotificationSubcategory {
    /// Every subcategory.
    pub const ALL: [NotificationSubcategory; 15] = [
        Self::LessonCompletion,
        Self::CourseMilestone,
        Self::StreakReminder,
        Self::NewContent,
        Self::CourseAnnouncement,
        Self::LiveSessionReminder,
        Self::OfficeHoursUpdate,
        Self::AssessmentGraded,
        Self::AssessmentDue,
        Self::DiscussionReply,
        Self::Mention,
        Self::DirectMessage,
        Self::SecurityAlert,
        Self::AccountUpdate,
        Self::Maintenance,
    ];

    /// Owning category.
    pub fn category(&self) -> NotificationCategory {
        match self {
            Self::LessonCompletion | Self::CourseMilestone | Self::StreakReminder => {
                NotificationCategory::Progress
            }
            Self::NewContent
            | Self::CourseAnnouncement
            | Self::LiveSessionReminder
            | Self::OfficeHoursUpdate => NotificationCategory::Course,
            Self::AssessmentGraded | Self::AssessmentDue => NotificationCategory::Assessment,
            Self::DiscussionReply | Self::Mention | Self::DirectMessage => {
                NotificationCategory::Community
            }
            Self::SecurityAlert | Self::AccountUpdate | Self::Maintenance => {
                NotificationCategory::System
            }
        }
    }

    /// Security-critical subcategories can never be silenced in-app.
    pub fn is_security_critical(&self) -> bool {
        matches!(self, Self::SecurityAlert)
    }

    /// Return the subcategory as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessonCompletion => "lesson_completion",
            Self::CourseMilestone => "course_milestone",
            Self::StreakReminder => "streak_reminder",
            Self::NewContent => "new_content",
            Self::CourseAnnouncement => "course_announcement",
            Self::LiveSessionReminder => "live_session_reminder",
            Self::OfficeHoursUpdate => "office_hours_update",
            Self::AssessmentGraded => "assessment_graded",
            Self::AssessmentDue => "assessment_due",
            Self::DiscussionReply => "discussion_reply",
            Self::Mention => "mention",
            Self::DirectMessage => "direct_message",
            Self::SecurityAlert => "security_alert",
            Self::AccountUpdate => "account_update",
            Self::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for NotificationSubcategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NotificationSubcategory {
    type Err = learnhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sub| sub.as_str() == s)
            .ok_or_else(|| {
                learnhub_core::AppError::validation(format!(
                    "Invalid notification subcategory: '{s}'"
                ))
            })
    }
}

/// Where a notification can be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    /// Inbox plus real-time push.
    InApp,
    /// Email relay.
    Email,
}

impl DeliveryChannel {
    /// Both channels.
    pub const ALL: [DeliveryChannel; 2] = [Self::InApp, Self::Email];
}
