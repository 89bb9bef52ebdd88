//! In-memory fakes for unit tests.
//!
//! [`ScriptedTransport`] replays queued `GetTask` responses and records every
//! submitted report.
//!
//! A transaction holds the store's mutex for its whole lifetime and works on
//! a copy of the state, which is written back on commit. That serialises
//! transactions the same way the single-connection SQLite writer does.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use exprflow_types::error::{RepositoryError, TransportError};
use exprflow_types::expression::{Expression, ExpressionId, ExpressionStatus, UserId};
use exprflow_types::rpc::{TaskAssignment, TaskReport};
use exprflow_types::task::{Task, TaskId, TaskStatus};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::compiler::TaskGraph;
use crate::repository::expression::ExpressionRepository;
use crate::repository::task::{TaskStore, TaskTransaction};
use crate::worker::TaskTransport;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryState {
    expressions: BTreeMap<ExpressionId, Expression>,
    tasks: BTreeMap<TaskId, Task>,
    next_expression_id: ExpressionId,
    next_task_id: TaskId,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    pub async fn expression(&self, id: ExpressionId) -> Expression {
        self.state.lock().await.expressions[&id].clone()
    }

    pub async fn remove_task(&self, id: TaskId) {
        self.state.lock().await.tasks.remove(&id);
    }
}

impl ExpressionRepository for MemoryStore {
    async fn create(
        &self,
        user_id: UserId,
        expression: &str,
        graph: &TaskGraph,
    ) -> Result<Expression, RepositoryError> {
        let mut state = self.state.lock().await;
        state.next_expression_id += 1;
        let now = Utc::now();
        let expr = Expression {
            id: state.next_expression_id,
            user_id,
            expression: expression.to_string(),
            status: ExpressionStatus::Pending,
            result: None,
            error: String::new(),
            created_at: now,
            updated_at: now,
        };

        let mut ids: Vec<TaskId> = Vec::with_capacity(graph.len());
        for compiled in graph.tasks() {
            state.next_task_id += 1;
            let id = state.next_task_id;
            let task = Task {
                id,
                expression_id: expr.id,
                operation: compiled.operation,
                args: compiled.args,
                dependencies: compiled.dependencies.map(|dep| dep.map(|index| ids[index])),
                status: TaskStatus::Pending,
                result: None,
            };
            state.tasks.insert(id, task);
            ids.push(id);
        }

        state.expressions.insert(expr.id, expr.clone());
        Ok(expr)
    }

    async fn get(
        &self,
        id: ExpressionId,
        user_id: UserId,
    ) -> Result<Option<Expression>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .expressions
            .get(&id)
            .filter(|e| e.user_id == user_id)
            .cloned())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Expression>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .expressions
            .values()
            .rev()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_tasks(&self, id: ExpressionId) -> Result<Vec<Task>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .tasks
            .values()
            .filter(|t| t.expression_id == id)
            .cloned()
            .collect())
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl MemoryTransaction {
    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, RepositoryError> {
        self.working.tasks.get_mut(&id).ok_or(RepositoryError::NotFound)
    }

    fn expression_mut(&mut self, id: ExpressionId) -> Result<&mut Expression, RepositoryError> {
        self.working
            .expressions
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)
    }
}

impl TaskStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTransaction { guard, working })
    }
}

impl TaskTransaction for MemoryTransaction {
    async fn pending_tasks(&mut self) -> Result<Vec<Task>, RepositoryError> {
        Ok(self
            .working
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .cloned()
            .collect())
    }

    async fn get_task(&mut self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        Ok(self.working.tasks.get(&id).cloned())
    }

    async fn expression_tasks(
        &mut self,
        expression_id: ExpressionId,
    ) -> Result<Vec<Task>, RepositoryError> {
        Ok(self
            .working
            .tasks
            .values()
            .filter(|t| t.expression_id == expression_id)
            .cloned()
            .collect())
    }

    async fn resolve_operand(
        &mut self,
        id: TaskId,
        slot: usize,
        value: f64,
    ) -> Result<(), RepositoryError> {
        self.task_mut(id)?.args[slot] = Some(value);
        Ok(())
    }

    async fn set_task_status(&mut self, id: TaskId, status: TaskStatus) -> Result<(), RepositoryError> {
        self.task_mut(id)?.status = status;
        Ok(())
    }

    async fn complete_task(&mut self, id: TaskId, result: f64) -> Result<(), RepositoryError> {
        let task = self.task_mut(id)?;
        task.result = Some(result);
        task.status = TaskStatus::Completed;
        Ok(())
    }

    async fn delete_expression_tasks(
        &mut self,
        expression_id: ExpressionId,
    ) -> Result<(), RepositoryError> {
        self.working
            .tasks
            .retain(|_, t| t.expression_id != expression_id);
        Ok(())
    }

    async fn expression_status(
        &mut self,
        expression_id: ExpressionId,
    ) -> Result<Option<ExpressionStatus>, RepositoryError> {
        Ok(self.working.expressions.get(&expression_id).map(|e| e.status))
    }

    async fn mark_expression_processing(
        &mut self,
        expression_id: ExpressionId,
    ) -> Result<(), RepositoryError> {
        let expr = self.expression_mut(expression_id)?;
        if expr.status == ExpressionStatus::Pending {
            expr.status = ExpressionStatus::Processing;
        }
        Ok(())
    }

    async fn complete_expression(
        &mut self,
        expression_id: ExpressionId,
        result: f64,
    ) -> Result<(), RepositoryError> {
        let expr = self.expression_mut(expression_id)?;
        expr.status = ExpressionStatus::Completed;
        expr.result = Some(result);
        Ok(())
    }

    async fn fail_expression(
        &mut self,
        expression_id: ExpressionId,
        error: &str,
    ) -> Result<(), RepositoryError> {
        let expr = self.expression_mut(expression_id)?;
        expr.status = ExpressionStatus::Error;
        expr.error = error.to_string();
        Ok(())
    }

    async fn commit(mut self) -> Result<(), RepositoryError> {
        *self.guard = self.working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Transport answering `get_task` from a queue, then with "no task".
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Option<TaskAssignment>, TransportError>>>,
    reports: Mutex<Vec<TaskReport>>,
}

impl ScriptedTransport {
    pub async fn push(&self, response: Result<Option<TaskAssignment>, TransportError>) {
        self.responses.lock().await.push_back(response);
    }

    pub async fn reports(&self) -> Vec<TaskReport> {
        self.reports.lock().await.clone()
    }
}

impl TaskTransport for ScriptedTransport {
    async fn get_task(&self) -> Result<Option<TaskAssignment>, TransportError> {
        self.responses.lock().await.pop_front().unwrap_or(Ok(None))
    }

    async fn submit_result(&self, report: &TaskReport) -> Result<(), TransportError> {
        self.reports.lock().await.push(report.clone());
        Ok(())
    }
}
