//! Infrastructure layer for exprflow.
//!
//! Contains implementations of the ports defined in `exprflow-core`: SQLite
//! storage, the HTTP RPC client used by agents, configuration loading, data
//! directory layout and API key hashing (SHA-256).

pub mod config;
pub mod crypto;
pub mod filesystem;
pub mod rpc;
pub mod sqlite;
