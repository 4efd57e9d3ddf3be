//! Error type for the record store
//!
//! Every model operation returns `Result<T, StoreError>`. The variants mirror
//! the failure kinds the HTTP layer distinguishes:
//!
//! - `Validation`: malformed or missing input, detected before any write
//! - `Conflict`: a uniqueness (or restricting foreign key) constraint rejected the write
//! - `NotFound`: no row matched the given id
//! - `Database`: anything else the store reported
//!
//! Conflict and not-found are derived from PostgreSQL SQLSTATE codes and
//! empty `RETURNING` results. They are never retried.

use thiserror::Error;

/// PostgreSQL SQLSTATE for `unique_violation`
pub const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for `foreign_key_violation`
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by models and the update builder
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input failed validation
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Uniqueness or ownership constraint violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// No row matched
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Creates a validation error for a single field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Returns the SQLSTATE code carried by a database error, if any
pub fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
        _ => None,
    }
}

/// Checks whether the error is a unique constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(UNIQUE_VIOLATION)
}

/// Checks whether the error is a foreign key violation
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(FOREIGN_KEY_VIOLATION)
}
