//! Expression repository trait definition.

use exprflow_types::error::RepositoryError;
use exprflow_types::expression::{Expression, ExpressionId, UserId};
use exprflow_types::task::Task;

use crate::compiler::TaskGraph;

/// Persistence for expressions and the initial flush of their task graphs.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ExpressionRepository: Send + Sync {
    /// Insert a pending expression together with every task of `graph`, in
    /// one transaction. Arena indices in the graph are translated to the
    /// row ids assigned on insertion.
    fn create(
        &self,
        user_id: UserId,
        expression: &str,
        graph: &TaskGraph,
    ) -> impl std::future::Future<Output = Result<Expression, RepositoryError>> + Send;

    /// Get an expression by id, only if `user_id` owns it.
    fn get(
        &self,
        id: ExpressionId,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<Expression>, RepositoryError>> + Send;

    /// List a user's expressions, newest first.
    fn list_by_user(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Expression>, RepositoryError>> + Send;

    /// Tasks still stored for an expression, in evaluation order. Empty once
    /// the expression has finished.
    fn list_tasks(
        &self,
        id: ExpressionId,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, RepositoryError>> + Send;
}
