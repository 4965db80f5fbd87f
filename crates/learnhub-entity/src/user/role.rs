//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles carried by verified identity tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Platform administrator.
    Admin,
    /// Teaches courses, hosts office hours and live sessions.
    Instructor,
    /// Learner.
    Student,
}

impl UserRole {
    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether the role may create office-hours schedules and live sessions.
    pub fn can_host(&self) -> bool {
        matches!(self, Self::Admin | Self::Instructor)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Instructor => "instructor",
            Self::Student => "student",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = learnhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "instructor" => Ok(Self::Instructor),
            "student" => Ok(Self::Student),
            _ => Err(learnhub_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: admin, instructor, student"
            ))),
        }
    }
}
