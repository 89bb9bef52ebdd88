//! Business logic and port definitions for exprflow.
//!
//! This crate defines the "ports" (repository and transport traits) that the
//! infrastructure layer implements. It depends only on `exprflow-types` --
//! never on `exprflow-infra` or any database/IO crate.

pub mod compiler;
pub mod evaluator;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;
