//! Application state and router builder
//!
//! # Example
//!
//! ```no_run
//! use taskdesk_api::{app::{build_router, AppState}, config::Config};
//! use taskdesk_shared::db::pool::create_pool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = create_pool(config.database_pool_config()).await?;
//! let app = build_router(AppState::new(pool, config));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use crate::{config::Config, error::ApiError, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through axum's `State` extractor. The pool is
/// itself reference-counted, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the router with every route and the middleware stack
///
/// ```text
/// /
/// ├── GET    /health
/// ├── GET    /sending_user
/// ├── POST   /insert_user
/// ├── PUT    /edit_user/:id
/// ├── DELETE /delete_user/:id
/// ├── GET    /users/:user_id/tasks
/// ├── POST   /users/:user_id/tasks
/// ├── GET    /tasks/:task_id
/// ├── PUT    /tasks/:task_id
/// └── DELETE /tasks/:task_id
/// ```
///
/// Requests are traced with tower-http's `TraceLayer`; CORS follows
/// `config.api.cors_origins`.
pub fn build_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/sending_user", get(routes::users::list_users))
        .route("/insert_user", post(routes::users::insert_user))
        .route("/edit_user/:id", put(routes::users::edit_user))
        .route(
            "/delete_user/:id",
            axum::routing::delete(routes::users::delete_user),
        );

    let task_routes = Router::new()
        .route(
            "/users/:user_id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        );

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(user_routes)
        .merge(task_routes)
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors),
        )
        .with_state(state)
}

/// Builds the CORS layer for the configured origins
///
/// A `*` entry allows any origin (the browser client is usually served from
/// a different port during development).
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
