//! Enrollment and course-ownership lookups.

use async_trait::async_trait;
use uuid::Uuid;

use learnhub_core::AppResult;

/// Answers the course-membership questions that scope room visibility.
#[async_trait]
pub trait AccessDirectory: Send + Sync + std::fmt::Debug {
    /// Is `user_id` enrolled in `course_id`?
    async fn is_enrolled(&self, user_id: Uuid, course_id: Uuid) -> AppResult<bool>;

    /// Does `user_id` own (teach) `course_id`?
    async fn owns_course(&self, user_id: Uuid, course_id: Uuid) -> AppResult<bool>;

    /// Either of the above.
    async fn can_view_course(&self, user_id: Uuid, course_id: Uuid) -> AppResult<bool> {
        Ok(self.owns_course(user_id, course_id).await?
            || self.is_enrolled(user_id, course_id).await?)
    }
}

/// Directory that grants every lookup. Used until an enrollment service is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllDirectory;

#[async_trait]
impl AccessDirectory for AllowAllDirectory {
    async fn is_enrolled(&self, _user_id: Uuid, _course_id: Uuid) -> AppResult<bool> {
        Ok(true)
    }

    async fn owns_course(&self, _user_id: Uuid, _course_id: Uuid) -> AppResult<bool> {
        Ok(true)
    }
}
