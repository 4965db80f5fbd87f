//! Unified application error types for LearnHub.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The kinds are stable: callers branch
//! on [`ErrorKind`], never on the message text.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Malformed input, rejected before any state was touched.
    Validation,
    /// A uniqueness rule was violated (duplicate queue join, etc.).
    Conflict,
    /// An admission was denied because the resource is full.
    CapacityExceeded,
    /// The resource is missing or in the wrong lifecycle state for the operation.
    NotFound,
    /// No verified identity accompanied the request.
    Authentication,
    /// The caller lacks the ownership or role required for the action.
    Authorization,
    /// The relational store failed or was unreachable.
    Database,
    /// A dependency (transport, email relay) is temporarily unavailable.
    ServiceUnavailable,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal server error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether this kind belongs to the transient-infrastructure class.
    ///
    /// Transient errors on admission writes are surfaced as failures and
    /// never retried by the core.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database | Self::ServiceUnavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::CapacityExceeded => write!(f, "CAPACITY_EXCEEDED"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Database => write!(f, "DATABASE"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout LearnHub.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a capacity-exceeded error.
    pub fn capacity_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CapacityExceeded, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the error is transient infrastructure trouble.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = AppError::capacity_exceeded("Session is full");
        assert_eq!(err.to_string(), "CAPACITY_EXCEEDED: Session is full");
    }

    #[test]
    fn test_transient_classification() {
        assert!(AppError::database("down").is_transient());
        assert!(AppError::service_unavailable("relay").is_transient());
        assert!(!AppError::conflict("dup").is_transient());
        assert!(!AppError::capacity_exceeded("full").is_transient());
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("boom");
        let err = AppError::with_source(ErrorKind::Database, "query failed", io);
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Database);
        assert!(cloned.source.is_none());
    }
}
