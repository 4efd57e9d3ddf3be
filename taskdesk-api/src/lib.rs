//! # TaskDesk API Server Library
//!
//! HTTP surface for the TaskDesk backend: user management plus per-user task
//! lists, served as JSON over axum.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: JSON and path extractors with uniform rejections
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
