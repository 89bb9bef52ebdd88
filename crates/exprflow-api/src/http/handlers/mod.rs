//! HTTP request handlers for the REST API and the agent RPCs.

pub mod expression;
pub mod rpc;
