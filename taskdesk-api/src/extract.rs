//! Request extractors with JSON error bodies
//!
//! Axum's built-in `Json` and `Path` extractors reject with plain-text
//! responses. These wrappers reject with [`ApiError`] instead, so malformed
//! bodies and non-numeric ids still produce `{"error": ...}` with status 400.

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts};

/// `axum::Json` that rejects with `ApiError`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Path` that rejects with `ApiError`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);
