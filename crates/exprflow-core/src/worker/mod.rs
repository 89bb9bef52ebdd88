//! Worker side: polling loops that fetch tasks over RPC, compute them under
//! a per-operation minimum duration, and report results back.

pub mod agent;
pub mod runner;
pub mod transport;

use exprflow_types::task::TaskId;
use thiserror::Error;

pub use agent::Agent;
pub use runner::{Worker, WorkerSettings};
pub use transport::TaskTransport;

/// Conditions that stop the whole agent, not just one task.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("computation of task {task_id} panicked: {message}")]
    ComputationPanicked { task_id: TaskId, message: String },

    #[error("computation of task {task_id} was aborted: {message}")]
    ComputationAborted { task_id: TaskId, message: String },
}
