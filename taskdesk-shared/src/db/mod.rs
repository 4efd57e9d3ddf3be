//! Database layer
//!
//! - `pool`: PostgreSQL connection pool lifecycle and health checks
//! - `update`: typed builder for single-statement partial updates
//!
//! Models live in the `models` module at the crate root.

pub mod pool;
pub mod update;
