//! Error handling for the API server
//!
//! Handlers return `ApiResult<T>`. `ApiError` converts into an HTTP response
//! whose body is always JSON with an `error` string:
//!
//! ```json
//! { "error": "Mail address already exists." }
//! ```
//!
//! Validation failures additionally list the offending fields under
//! `details`. Internal errors are logged and replaced with a generic message.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use taskdesk_shared::error::StoreError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every failure a handler can report
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unreadable body or path (400)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Well-formed input that failed field validation (400)
    #[error("validation failed on {} field(s)", .0.len())]
    ValidationError(Vec<FieldError>),

    /// No row or route matches (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness or ownership conflict (409)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Anything the caller cannot fix (500); the message is only logged
    #[error("internal: {0}")]
    InternalError(String),
}

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self) -> ErrorBody {
        match self {
            ApiError::BadRequest(error) | ApiError::NotFound(error) | ApiError::Conflict(error) => {
                ErrorBody {
                    error,
                    details: Vec::new(),
                }
            }
            ApiError::ValidationError(details) => ErrorBody {
                error: details
                    .iter()
                    .map(|detail| detail.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
                details,
            },
            ApiError::InternalError(cause) => {
                tracing::error!(%cause, "Request failed");
                ErrorBody {
                    error: "An internal error occurred".to_string(),
                    details: Vec::new(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.into_body())).into_response()
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation { field, message } => {
                ApiError::ValidationError(vec![FieldError { field, message }])
            }
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Database(err) => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::from(err).into()
    }
}

/// Convert derive-based request validation to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();
        // field_errors() is a HashMap; keep the response stable
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

/// Malformed JSON, wrong content type, or a body of the wrong shape
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Non-numeric ids in the path
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}
