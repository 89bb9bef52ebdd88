//! HTTP layer for exprflow.
//!
//! Axum-based REST API at `/api/v1/` with API key authentication and
//! envelope response format, plus the MessagePack RPC endpoints at
//! `/rpc/v1/` used by agents.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
