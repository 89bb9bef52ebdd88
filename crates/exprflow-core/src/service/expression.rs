//! Expression submission and lookup service.
//!
//! Compiles submitted strings and hands the resulting task graph to the
//! repository. Parse failures never reach storage.

use exprflow_types::error::{ExpressionError, RepositoryError};
use exprflow_types::expression::{Expression, ExpressionId, UserId};
use exprflow_types::task::Task;

use crate::compiler;
use crate::repository::expression::ExpressionRepository;

/// Service orchestrating expression submission.
///
/// Generic over the repository trait to maintain clean architecture --
/// exprflow-core never depends on exprflow-infra.
pub struct ExpressionService<R: ExpressionRepository> {
    repo: R,
}

fn storage(err: RepositoryError) -> ExpressionError {
    ExpressionError::StorageError(err.to_string())
}

impl<R: ExpressionRepository> ExpressionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Compile `input` and persist it with its tasks, owned by `user_id`.
    pub async fn submit(&self, user_id: UserId, input: &str) -> Result<Expression, ExpressionError> {
        let graph = compiler::compile(input)?;
        let expression = self.repo.create(user_id, input, &graph).await.map_err(storage)?;

        tracing::info!(
            expression_id = expression.id,
            user_id,
            tasks = graph.len(),
            "expression submitted"
        );
        Ok(expression)
    }

    pub async fn get(&self, user_id: UserId, id: ExpressionId) -> Result<Expression, ExpressionError> {
        self.repo
            .get(id, user_id)
            .await
            .map_err(storage)?
            .ok_or(ExpressionError::NotFound)
    }

    pub async fn list(&self, user_id: UserId) -> Result<Vec<Expression>, ExpressionError> {
        self.repo.list_by_user(user_id).await.map_err(storage)
    }

    /// Tasks of an unfinished expression owned by `user_id`.
    pub async fn tasks(&self, user_id: UserId, id: ExpressionId) -> Result<Vec<Task>, ExpressionError> {
        let expression = self.get(user_id, id).await?;
        self.repo.list_tasks(expression.id).await.map_err(storage)
    }
}
