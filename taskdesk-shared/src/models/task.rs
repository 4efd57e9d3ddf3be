//! Task model and database operations
//!
//! A task belongs to exactly one user. Ownership is fixed at creation time:
//! `user_id` is never part of an update.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id SERIAL PRIMARY KEY,
//!     user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     title VARCHAR(255) NOT NULL,
//!     description TEXT,
//!     due_date DATE,
//!     status VARCHAR(20) NOT NULL DEFAULT 'pending',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use crate::db::update::{BindValue, SqlValue, UpdateSet};
use crate::error::{is_foreign_key_violation, StoreError, StoreResult};
use crate::patch::{self, FieldPatch};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

const COLUMNS: &str =
    "id, user_id, title, description, due_date, status, created_at, updated_at";

/// Progress of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// Raised when a stored or supplied status is not a known variant
#[derive(Debug, Error)]
#[error("unknown task status: {0}")]
pub struct UnknownStatus(pub String);

impl TaskStatus {
    /// String stored in the `status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl BindValue for TaskStatus {
    fn into_sql(value: Option<Self>) -> SqlValue {
        SqlValue::Text(value.map(|status| status.as_str().to_string()))
    }
}

/// A stored task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i32,

    /// Owning user
    pub user_id: i32,

    pub title: String,

    pub description: Option<String>,

    pub due_date: Option<NaiveDate>,

    #[sqlx(try_from = "String")]
    pub status: TaskStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub user_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
}

impl CreateTask {
    /// Builds a create input from a request body
    ///
    /// `status` falls back to `pending` when omitted or empty. Any `user_id`
    /// in the body is ignored in favor of `user_id` from the route.
    pub fn from_json(user_id: i32, title: String, body: &Map<String, Value>) -> StoreResult<Self> {
        Ok(Self {
            user_id,
            title,
            description: patch::text("description", body.get("description"))?.into_option(),
            due_date: patch::date("due_date", body.get("due_date"))?.into_option(),
            status: patch::enumerated::<TaskStatus>("status", body.get("status"))?
                .into_option()
                .unwrap_or_default(),
        })
    }
}

/// Parsed partial update for a task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateTask {
    pub title: FieldPatch<String>,
    pub description: FieldPatch<String>,
    pub due_date: FieldPatch<NaiveDate>,
    pub status: FieldPatch<TaskStatus>,
}

impl UpdateTask {
    /// Parses the recognized keys of an update body
    ///
    /// `user_id`, `id` and timestamps are not updatable and are ignored.
    pub fn from_json(body: &Map<String, Value>) -> StoreResult<Self> {
        Ok(Self {
            title: patch::required("title", patch::text("title", body.get("title"))?)?,
            description: patch::text("description", body.get("description"))?,
            due_date: patch::date("due_date", body.get("due_date"))?,
            status: patch::required("status", patch::enumerated("status", body.get("status"))?)?,
        })
    }

    pub fn to_update_set(&self) -> UpdateSet {
        let mut set = UpdateSet::new("tasks").touch("updated_at");
        set.push("title", self.title.clone());
        set.push("description", self.description.clone());
        set.push("due_date", self.due_date.clone());
        set.push("status", self.status.clone());
        set
    }
}

impl Task {
    /// Inserts a task for an existing user
    ///
    /// # Errors
    ///
    /// - `NotFound` if the owning user does not exist (foreign key violation)
    pub async fn create(pool: &PgPool, data: CreateTask) -> StoreResult<Self> {
        let result = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (user_id, title, description, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_date)
        .bind(data.status.as_str())
        .fetch_one(pool)
        .await;

        match result {
            Ok(task) => {
                info!(task_id = task.id, user_id = task.user_id, "Task created");
                Ok(task)
            }
            Err(err) if is_foreign_key_violation(&err) => {
                Err(StoreError::NotFound("User not found".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Finds a task by id
    pub async fn find_by_id(pool: &PgPool, id: i32) -> StoreResult<Option<Self>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a user's tasks, earliest due date first
    ///
    /// Tasks without a due date sort after dated ones; ties fall back to
    /// creation time. An unknown user simply has no tasks.
    pub async fn list_by_user(pool: &PgPool, user_id: i32) -> StoreResult<Vec<Self>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE user_id = $1
            ORDER BY due_date ASC, created_at ASC
            "#,
            COLUMNS
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies a partial update and bumps `updated_at`
    ///
    /// # Errors
    ///
    /// - `Validation` if no field was supplied (no statement is issued)
    /// - `NotFound` if no task has this id
    pub async fn update(pool: &PgPool, id: i32, data: UpdateTask) -> StoreResult<Self> {
        let set = data.to_update_set();
        let columns = set.columns();
        let mut builder = set.into_query(id, COLUMNS)?;

        let task = builder
            .build_query_as::<Task>()
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("Task not found".to_string()))?;

        info!(task_id = id, ?columns, "Task updated");
        Ok(task)
    }

    /// Deletes a task and returns the row as it was before deletion
    pub async fn delete(pool: &PgPool, id: i32) -> StoreResult<Self> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 RETURNING {}",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("Task not found".to_string()))?;

        info!(task_id = id, user_id = task.user_id, "Task deleted");
        Ok(task)
    }

    /// Counts a user's tasks
    pub async fn count_by_user(pool: &PgPool, user_id: i32) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
