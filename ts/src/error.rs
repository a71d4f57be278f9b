//! TaskStore error types

use thiserror::Error;

/// Reasons a task is rejected before it reaches storage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskValidationError {
    #[error("Task title must not be empty")]
    EmptyTitle,

    #[error("Reminder time must be before deadline")]
    ReminderNotBeforeDeadline,

    #[error("Task owner must not be empty")]
    MissingOwner,
}

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] TaskValidationError),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid persisted data: {0}")]
    InvalidData(String),
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
