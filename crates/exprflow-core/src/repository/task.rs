//! Transactional task store trait definitions.
//!
//! The scheduler composes these primitives into atomic units of work. Every
//! method of [`TaskTransaction`] runs inside the transaction opened by
//! [`TaskStore::begin`]; nothing becomes visible to other callers until
//! [`TaskTransaction::commit`].
//!
//! Implementations must serialise concurrent transactions strongly enough
//! that two callers can never both observe the same pending task and both
//! commit its transition to processing.

use exprflow_types::error::RepositoryError;
use exprflow_types::expression::{ExpressionId, ExpressionStatus};
use exprflow_types::task::{Task, TaskId, TaskStatus};

pub trait TaskStore: Send + Sync {
    type Tx: TaskTransaction;

    /// Open a read-write transaction.
    fn begin(&self) -> impl std::future::Future<Output = Result<Self::Tx, RepositoryError>> + Send;
}

pub trait TaskTransaction: Send + Sized {
    /// All pending tasks, in storage (id) order.
    fn pending_tasks(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, RepositoryError>> + Send;

    fn get_task(
        &mut self,
        id: TaskId,
    ) -> impl std::future::Future<Output = Result<Option<Task>, RepositoryError>> + Send;

    /// Every task still stored for an expression.
    fn expression_tasks(
        &mut self,
        expression_id: ExpressionId,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, RepositoryError>> + Send;

    /// Fill operand `slot` of a task with a dependency's result.
    fn resolve_operand(
        &mut self,
        id: TaskId,
        slot: usize,
        value: f64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn set_task_status(
        &mut self,
        id: TaskId,
        status: TaskStatus,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Store a task's result and mark it completed.
    fn complete_task(
        &mut self,
        id: TaskId,
        result: f64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn delete_expression_tasks(
        &mut self,
        expression_id: ExpressionId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Current status of an expression, `None` if it does not exist.
    fn expression_status(
        &mut self,
        expression_id: ExpressionId,
    ) -> impl std::future::Future<Output = Result<Option<ExpressionStatus>, RepositoryError>> + Send;

    /// Move an expression from pending to processing. No-op in any other
    /// status.
    fn mark_expression_processing(
        &mut self,
        expression_id: ExpressionId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn complete_expression(
        &mut self,
        expression_id: ExpressionId,
        result: f64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn fail_expression(
        &mut self,
        expression_id: ExpressionId,
        error: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn commit(self) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn rollback(self) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
