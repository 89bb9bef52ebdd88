//! Shared domain types for exprflow.
//!
//! Expressions, the tasks they compile into, the RPC messages exchanged with
//! workers, service configuration, and the error enums used across crates.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod expression;
pub mod rpc;
pub mod task;
