//! Error Types for the Test Run Service
//!
//! This module defines error handling for the service layer:
//! - ServiceError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - Conversions from the core error taxonomy
//!
//! Errors serialize as JSON so any transport in front of the service can pass
//! them through unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use testrun_core::{StorageError, TestRunError, ValidationError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for service responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Request contains invalid input data
    InvalidInput,

    /// Field format is incorrect
    InvalidFormat,

    // ========================================================================
    // Not Found Errors
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    /// Requested test run does not exist
    TestRunNotFound,

    // ========================================================================
    // Server Errors
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Database operation failed
    DatabaseError,

    /// Backing store is temporarily unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::TestRunNotFound => "Test run not found",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        }
    }

    /// Whether the caller can fix the request and retry.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::InvalidInput
                | ErrorCode::InvalidFormat
                | ErrorCode::EntityNotFound
                | ErrorCode::TestRunNotFound
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// SERVICE ERROR STRUCT
// ============================================================================

/// Structured error returned by every service operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServiceError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create an InvalidFormat error.
    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    /// Create an EntityNotFound error.
    pub fn entity_not_found(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("{} with id {} not found", entity_type, id),
        )
    }

    /// Create a TestRunNotFound error.
    pub fn test_run_not_found(test_run_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::TestRunNotFound,
            format!("Test run {} not found", test_run_id),
        )
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a DatabaseError.
    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Create a ServiceUnavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

// ============================================================================
// CONVERSIONS FROM CORE ERRORS
// ============================================================================

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        match &err {
            ValidationError::InvalidNumber { field, .. } => {
                ServiceError::invalid_format(field, "a number")
                    .with_details(serde_json::json!({ "reason": err.to_string() }))
            }
            ValidationError::InvalidId { field, .. } => {
                ServiceError::invalid_format(field, "an id")
                    .with_details(serde_json::json!({ "reason": err.to_string() }))
            }
            ValidationError::InvalidSortDirection { .. } => {
                ServiceError::invalid_format("sort_direction", "1 or -1")
            }
            ValidationError::OverlappingColumnFields { keys } => {
                ServiceError::invalid_input(err.to_string())
                    .with_details(serde_json::json!({ "keys": keys }))
            }
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "Storage error");

        match err {
            StorageError::NotFound { entity_type, id } => {
                ServiceError::entity_not_found(&entity_type.to_string(), id)
            }
            StorageError::Unavailable { .. } => {
                ServiceError::service_unavailable("Backing store is unavailable")
            }
            // Query details stay in the log.
            StorageError::QueryFailed { .. } | StorageError::UpdateFailed { .. } => {
                ServiceError::database_error("Database operation failed")
            }
        }
    }
}

impl From<TestRunError> for ServiceError {
    fn from(err: TestRunError) -> Self {
        match err {
            TestRunError::Storage(e) => e.into(),
            TestRunError::Validation(e) => e.into(),
        }
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
