//! # TaskDesk Shared Library
//!
//! Data layer of the TaskDesk record service: the connection pool, the user
//! and task models, and the partial-update machinery behind the edit
//! endpoints.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and the `UPDATE` statement builder
//! - `models`: user and task records with their queries
//! - `patch`: tri-state parsing of partial-update bodies
//! - `error`: store error taxonomy

pub mod db;
pub mod error;
pub mod models;
pub mod patch;

/// Current version of the TaskDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
