//! Database models and their CRUD operations
//!
//! - `user`: user records, unique by mail address
//! - `task`: tasks owned by a user
//!
//! # Example
//!
//! ```no_run
//! use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
//! use taskdesk_shared::models::task::{CreateTask, Task, TaskStatus};
//! use taskdesk_shared::models::user::{CreateUser, User};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//!
//! let user = User::create(&pool, CreateUser {
//!     username: "a".to_string(),
//!     mail: "a@x.com".to_string(),
//!     password: "p".to_string(),
//!     ..Default::default()
//! }).await?;
//!
//! let task = Task::create(&pool, CreateTask {
//!     user_id: user.id,
//!     title: "Write report".to_string(),
//!     description: None,
//!     due_date: None,
//!     status: TaskStatus::Pending,
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod task;
pub mod user;
