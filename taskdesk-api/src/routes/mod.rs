//! API route handlers
//!
//! Handlers are organized by resource:
//!
//! - `health`: liveness and database connectivity
//! - `users`: user listing, creation, partial update and deletion
//! - `tasks`: per-user task listing and single-task CRUD

pub mod health;
pub mod tasks;
pub mod users;

use serde::{Deserialize, Serialize};
use validator::ValidationError;

/// Plain confirmation body, e.g. after a delete
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Rejects strings that are empty after trimming
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
