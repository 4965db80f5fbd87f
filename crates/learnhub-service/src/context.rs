//! Request context carrying the verified identity of the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use learnhub_core::AppError;
use learnhub_entity::user::UserRole;

/// Context for the current authenticated request or transport connection.
///
/// Built from verified token claims and passed into service methods so
/// that every operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// The user's role at the time the token was issued.
    pub role: UserRole,
    /// The username (convenience field from token claims).
    pub username: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: Uuid, role: UserRole, username: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            username: username.into(),
            request_time: Utc::now(),
        }
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fails unless the caller may host office hours and live sessions.
    pub fn require_host(&self) -> Result<(), AppError> {
        if self.role.can_host() {
            Ok(())
        } else {
            Err(AppError::authorization(
                "Only instructors and admins can do this",
            ))
        }
    }

    /// Fails unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::authorization("Admin role required"))
        }
    }

    /// Fails unless the caller is `owner_id`. Admin does not bypass this.
    pub fn require_owner(&self, owner_id: Uuid, what: &str) -> Result<(), AppError> {
        if self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Only the owner of this {what} can do this"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnhub_core::error::ErrorKind;

    #[test]
    fn test_owner_check_ignores_admin_role() {
        let admin = RequestContext::new(Uuid::new_v4(), UserRole::Admin, "root");
        let err = admin.require_owner(Uuid::new_v4(), "session").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert!(admin.require_owner(admin.user_id, "session").is_ok());
    }

    #[test]
    fn test_students_cannot_host() {
        let student = RequestContext::new(Uuid::new_v4(), UserRole::Student, "sam");
        assert!(student.require_host().is_err());
        assert!(student.require_admin().is_err());
    }
}
