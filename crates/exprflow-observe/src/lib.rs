//! Observability setup for exprflow binaries.

pub mod tracing_setup;
