//! Task endpoints
//!
//! - `GET    /users/:user_id/tasks` - List a user's tasks
//! - `POST   /users/:user_id/tasks` - Create a task for a user
//! - `GET    /tasks/:task_id`       - Fetch one task
//! - `PUT    /tasks/:task_id`       - Partially update a task
//! - `DELETE /tasks/:task_id`       - Delete a task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    routes::not_blank,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use taskdesk_shared::models::task::{CreateTask, Task, UpdateTask};
use validator::Validate;

/// Create-task request
///
/// Only `title` is required. `description`, `due_date` and `status` are
/// collected into `optional`; `status` defaults to `pending`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(
        required(message = "Title is required"),
        custom(function = "not_blank", message = "Title is required")
    )]
    pub title: Option<String>,

    #[serde(flatten)]
    pub optional: Map<String, Value>,
}

/// Delete-task response
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteTaskResponse {
    pub message: String,

    /// The task as it was before deletion
    #[serde(rename = "deletedTask")]
    pub deleted_task: Task,
}

/// List a user's tasks by due date
///
/// An unknown user yields an empty list.
pub async fn list_tasks(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i32>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_by_user(&state.db, user_id).await?;
    Ok(Json(tasks))
}

/// Create a task owned by the user in the path
///
/// # Endpoint
///
/// ```text
/// POST /users/:user_id/tasks
/// Content-Type: application/json
///
/// { "title": "Write report", "due_date": "2024-05-01" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing title or malformed value
/// - `404 Not Found`: the user does not exist
pub async fn create_task(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i32>,
    AppJson(req): AppJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let data = CreateTask::from_json(user_id, req.title.unwrap_or_default(), &req.optional)?;
    let task = Task::create(&state.db, data).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Fetch a single task
pub async fn get_task(
    State(state): State<AppState>,
    AppPath(task_id): AppPath<i32>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Partially update a task
///
/// Updatable keys are `title`, `description`, `due_date` and `status`.
/// The owner (`user_id`) cannot be changed.
pub async fn update_task(
    State(state): State<AppState>,
    AppPath(task_id): AppPath<i32>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> ApiResult<Json<Task>> {
    let update = UpdateTask::from_json(&body)?;
    let task = Task::update(&state.db, task_id, update).await?;

    Ok(Json(task))
}

/// Delete a task and echo it back
pub async fn delete_task(
    State(state): State<AppState>,
    AppPath(task_id): AppPath<i32>,
) -> ApiResult<Json<DeleteTaskResponse>> {
    let task = Task::delete(&state.db, task_id).await?;

    Ok(Json(DeleteTaskResponse {
        message: format!("Task {} deleted successfully.", task_id),
        deleted_task: task,
    }))
}
