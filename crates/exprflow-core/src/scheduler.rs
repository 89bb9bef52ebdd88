//! Dependency resolver and task dispatcher.
//!
//! Both entry points run as a single transaction against the [`TaskStore`]:
//! either every write of the call is committed or none is.
//!
//! - [`Scheduler::read_task`] scans pending tasks in storage order, copies
//!   finished dependency results into their operand slots, and claims the
//!   first task whose operands are all known.
//! - [`Scheduler::complete_task`] records a worker's report and closes the
//!   owning expression once its last task is done, or immediately on error.

use exprflow_types::error::{RepositoryError, SchedulerError};
use exprflow_types::rpc::{TaskReport, non_finite_error};
use exprflow_types::task::{Task, TaskStatus};

use crate::repository::task::{TaskStore, TaskTransaction};

/// Scheduler over an injected task store.
pub struct Scheduler<S: TaskStore> {
    store: S,
}

/// What a report did to the graph.
enum ReportOutcome {
    Applied,
    Stale,
}

impl<S: TaskStore> Scheduler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Claim one ready task, or `None` if no pending task is ready.
    ///
    /// This is a first-fit linear scan, not a priority queue. When nothing is
    /// claimed the transaction is rolled back, so a fruitless call leaves
    /// every row untouched.
    pub async fn read_task(&self) -> Result<Option<Task>, SchedulerError> {
        let mut tx = self.store.begin().await?;

        match Self::claim_ready_task(&mut tx).await {
            Ok(Some(task)) => {
                tx.commit().await?;
                tracing::debug!(
                    task_id = task.id,
                    expression_id = task.expression_id,
                    operation = %task.operation,
                    "task claimed"
                );
                Ok(Some(task))
            }
            Ok(None) => {
                tx.rollback().await?;
                Ok(None)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback after failed claim failed");
                }
                Err(err)
            }
        }
    }

    async fn claim_ready_task(tx: &mut S::Tx) -> Result<Option<Task>, SchedulerError> {
        let pending = tx.pending_tasks().await?;

        'tasks: for mut task in pending {
            for slot in task.operand_slots() {
                if task.args[slot].is_some() {
                    continue;
                }

                let dep_id = task.dependencies[slot].ok_or(SchedulerError::UnresolvableOperand {
                    task_id: task.id,
                    slot,
                })?;
                let dependency = tx.get_task(dep_id).await?.ok_or(RepositoryError::NotFound)?;

                if dependency.status != TaskStatus::Completed {
                    continue 'tasks;
                }

                let value = dependency.result.ok_or(SchedulerError::UnresolvableOperand {
                    task_id: task.id,
                    slot,
                })?;
                tx.resolve_operand(task.id, slot, value).await?;
                task.args[slot] = Some(value);
            }

            tx.set_task_status(task.id, TaskStatus::Processing).await?;
            tx.mark_expression_processing(task.expression_id).await?;
            task.status = TaskStatus::Processing;
            return Ok(Some(task));
        }

        Ok(None)
    }

    /// Apply a worker's report.
    ///
    /// An error report fails the expression and discards all of its tasks,
    /// including siblings still in flight. A successful report completes the
    /// task; if it was the last one, its result (the root's, by construction)
    /// becomes the expression result and the tasks are deleted.
    ///
    /// A success report carrying a non-finite result is applied as a failure.
    /// Reports for tasks that no longer exist, were never claimed, or whose
    /// expression already finished are discarded.
    pub async fn complete_task(&self, report: &TaskReport) -> Result<(), SchedulerError> {
        let mut tx = self.store.begin().await?;

        match Self::apply_report(&mut tx, report).await {
            Ok(ReportOutcome::Applied) => tx.commit().await.map_err(Into::into),
            Ok(ReportOutcome::Stale) => tx.rollback().await.map_err(Into::into),
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback after failed report failed");
                }
                Err(err)
            }
        }
    }

    async fn apply_report(
        tx: &mut S::Tx,
        report: &TaskReport,
    ) -> Result<ReportOutcome, SchedulerError> {
        let Some(task) = tx.get_task(report.id).await? else {
            tracing::warn!(
                task_id = report.id,
                expression_id = report.expression_id,
                "discarding report for unknown task"
            );
            return Ok(ReportOutcome::Stale);
        };
        let expression_id = task.expression_id;

        match tx.expression_status(expression_id).await? {
            Some(status) if !status.is_terminal() => {}
            status => {
                tracing::warn!(
                    task_id = task.id,
                    expression_id,
                    status = ?status,
                    "discarding report for finished expression"
                );
                return Ok(ReportOutcome::Stale);
            }
        }

        if task.status != TaskStatus::Processing {
            tracing::warn!(
                task_id = task.id,
                expression_id,
                status = %task.status,
                "discarding report for unclaimed task"
            );
            return Ok(ReportOutcome::Stale);
        }

        let error = if report.is_failure() {
            Some(report.error.as_str())
        } else {
            non_finite_error(report.result)
        };

        if let Some(error) = error {
            tx.fail_expression(expression_id, error).await?;
            tx.delete_expression_tasks(expression_id).await?;
            tracing::info!(
                task_id = task.id,
                expression_id,
                error,
                "expression failed"
            );
            return Ok(ReportOutcome::Applied);
        }

        tx.complete_task(task.id, report.result).await?;

        let tasks = tx.expression_tasks(expression_id).await?;
        if tasks.iter().all(|t| t.status == TaskStatus::Completed) {
            tx.complete_expression(expression_id, report.result).await?;
            tx.delete_expression_tasks(expression_id).await?;
            tracing::info!(expression_id, result = report.result, "expression completed");
        }

        Ok(ReportOutcome::Applied)
    }
}
