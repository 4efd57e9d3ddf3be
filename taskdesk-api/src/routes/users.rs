//! User endpoints
//!
//! - `GET    /sending_user`     - List all users
//! - `POST   /insert_user`      - Create a user
//! - `PUT    /edit_user/:id`    - Partially update a user
//! - `DELETE /delete_user/:id`  - Delete a user

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppJson, AppPath},
    routes::{not_blank, MessageResponse},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{Map, Value};
use taskdesk_shared::models::user::{CreateUser, UpdateUser, User};
use validator::Validate;

/// Create-user request
///
/// `username`, `mail` and `password` are required. Every other key
/// (`age`, `gender`, `birth`, `addr`, `phone`) is collected into `optional`
/// and parsed with the same rules as a partial update.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        required(message = "username is required"),
        custom(function = "not_blank", message = "username is required")
    )]
    pub username: Option<String>,

    #[validate(
        required(message = "mail is required"),
        custom(function = "not_blank", message = "mail is required")
    )]
    pub mail: Option<String>,

    #[validate(
        required(message = "password is required"),
        custom(function = "not_blank", message = "password is required")
    )]
    pub password: Option<String>,

    #[serde(flatten)]
    pub optional: Map<String, Value>,
}

/// List all users, ordered by id
///
/// # Endpoint
///
/// ```text
/// GET /sending_user
/// ```
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let users = User::list(&state.db).await?;
    Ok(Json(users))
}

/// Create a user
///
/// # Endpoint
///
/// ```text
/// POST /insert_user
/// Content-Type: application/json
///
/// { "username": "a", "mail": "a@x.com", "password": "p", "age": 30 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: a required field is missing or a value is malformed
/// - `409 Conflict`: the mail address is already registered
pub async fn insert_user(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate()?;

    let data = CreateUser {
        username: req.username.unwrap_or_default(),
        mail: req.mail.unwrap_or_default(),
        password: req.password.unwrap_or_default(),
        ..Default::default()
    }
    .with_optional_fields(&req.optional)?;

    let user = User::create(&state.db, data).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Partially update a user
///
/// Only keys present in the body are touched. `""` or `null` clears a
/// nullable field; a blank password leaves the password unchanged.
///
/// # Endpoint
///
/// ```text
/// PUT /edit_user/:id
/// Content-Type: application/json
///
/// { "age": 5, "phone": "" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: nothing to update, or a malformed value
/// - `404 Not Found`: no user with this id
/// - `409 Conflict`: the new mail address belongs to another user
pub async fn edit_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> ApiResult<Json<User>> {
    tracing::debug!(user_id = id, "Edit request received");

    let update = UpdateUser::from_json(&body)?;
    let user = User::update(&state.db, id, update).await?;

    Ok(Json(user))
}

/// Delete a user
///
/// # Endpoint
///
/// ```text
/// DELETE /delete_user/:id
/// ```
///
/// # Errors
///
/// - `404 Not Found`: no user with this id
/// - `409 Conflict`: the schema restricts deleting users that own tasks
pub async fn delete_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<MessageResponse>> {
    User::delete(&state.db, id).await?;

    Ok(Json(MessageResponse {
        message: format!("User {} deleted successfully.", id),
    }))
}
