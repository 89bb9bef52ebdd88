//! RPC transport port used by workers.

use exprflow_types::error::TransportError;
use exprflow_types::rpc::{TaskAssignment, TaskReport};

/// Client side of the orchestrator's `GetTask` / `SubmitResult` RPCs.
pub trait TaskTransport: Send + Sync {
    /// Fetch the next ready task. `None` when the orchestrator has nothing
    /// ready (the wire sentinel `id == 0`).
    fn get_task(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<TaskAssignment>, TransportError>> + Send;

    fn submit_result(
        &self,
        report: &TaskReport,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
