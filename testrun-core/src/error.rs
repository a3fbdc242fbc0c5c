//! Error types for test run operations

use crate::EntityType;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: EntityType, id: String },

    #[error("Query failed for {entity_type}: {reason}")]
    QueryFailed {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Update failed for {entity_type}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Validation errors for caller-supplied input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid number for {field}: {value}")]
    InvalidNumber { field: String, value: String },

    #[error("Invalid id for {field}: {value}")]
    InvalidId { field: String, value: String },

    #[error("Invalid sort direction: {value}")]
    InvalidSortDirection { value: String },

    #[error("Fields cannot be both locked and normal: {keys:?}")]
    OverlappingColumnFields { keys: Vec<String> },
}

/// Master error type for the test run core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TestRunError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for test run operations.
pub type TestRunResult<T> = Result<T, TestRunError>;

// =============================================================================
// TESTS
// =============================================================================
