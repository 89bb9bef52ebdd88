//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod expression;
pub mod pool;
pub mod task;
pub mod user;
