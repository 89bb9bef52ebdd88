//! A single worker's poll / compute / submit loop.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use exprflow_types::config::{AgentConfig, OperationDurations};
use exprflow_types::error::ComputeError;
use exprflow_types::rpc::{TaskAssignment, TaskReport};
use exprflow_types::task::Operation;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::transport::TaskTransport;
use super::AgentError;
use crate::evaluator;

/// Signature of the arithmetic step run for each task.
pub type ComputeFn = fn(&str, [Option<f64>; 2]) -> Result<f64, ComputeError>;

/// Timing knobs shared by every worker of an agent.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub poll_interval: Duration,
    pub error_backoff: Duration,
    pub durations: OperationDurations,
}

impl WorkerSettings {
    pub fn from_config(agent: &AgentConfig, durations: &OperationDurations) -> Self {
        Self {
            poll_interval: agent.poll_interval(),
            error_backoff: agent.error_backoff(),
            durations: durations.clone(),
        }
    }
}

/// One polling loop. Holds at most one task at a time.
pub struct Worker<T: TaskTransport> {
    id: usize,
    transport: Arc<T>,
    settings: WorkerSettings,
    fatal: mpsc::Sender<AgentError>,
    compute: ComputeFn,
}

impl<T: TaskTransport> Worker<T> {
    pub fn new(
        id: usize,
        transport: Arc<T>,
        settings: WorkerSettings,
        fatal: mpsc::Sender<AgentError>,
    ) -> Self {
        Self {
            id,
            transport,
            settings,
            fatal,
            compute: evaluator::calculate,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_compute(mut self, compute: ComputeFn) -> Self {
        self.compute = compute;
        self
    }

    /// Poll until `cancel` fires or a fatal error occurs.
    ///
    /// Sleeps and the task fetch are interrupted by cancellation; a task that
    /// has already been received is computed and submitted first.
    pub async fn run(self, cancel: CancellationToken) {
        let worker = self.id;
        let mut last_error: Option<String> = None;
        let mut waiting = false;

        tracing::info!(worker, "worker started");

        while !cancel.is_cancelled() {
            let fetched = tokio::select! {
                _ = cancel.cancelled() => break,
                fetched = self.transport.get_task() => fetched,
            };

            match fetched {
                Err(err) => {
                    let message = err.to_string();
                    if last_error.as_deref() != Some(message.as_str()) {
                        tracing::warn!(worker, error = %message, "failed to fetch task");
                        last_error = Some(message);
                    }
                    self.pause(&cancel, self.settings.error_backoff).await;
                }
                Ok(None) => {
                    last_error = None;
                    if !waiting {
                        tracing::info!(worker, "no tasks available, waiting");
                        waiting = true;
                    }
                    self.pause(&cancel, self.settings.poll_interval).await;
                }
                Ok(Some(assignment)) => {
                    last_error = None;
                    waiting = false;
                    tracing::debug!(
                        worker,
                        task_id = assignment.id,
                        expression_id = assignment.expression_id,
                        operation = assignment.operation.as_str(),
                        "task received"
                    );

                    let report = match self.execute(&assignment).await {
                        Ok(report) => report,
                        Err(err) => {
                            tracing::error!(worker, error = %err, "fatal worker error");
                            let _ = self.fatal.send(err).await;
                            return;
                        }
                    };

                    if let Err(err) = self.transport.submit_result(&report).await {
                        tracing::warn!(
                            worker,
                            task_id = report.id,
                            error = %err,
                            "failed to submit result"
                        );
                        self.pause(&cancel, self.settings.error_backoff).await;
                    }
                }
            }
        }

        tracing::info!(worker, "worker stopped");
    }

    /// Compute one task.
    ///
    /// The arithmetic runs as its own tokio task while the operation's
    /// minimum duration starts counting. A successful result is held back
    /// until that duration has elapsed; a computation error is reported
    /// straight away. A panic inside the computation is fatal.
    pub async fn execute(&self, assignment: &TaskAssignment) -> Result<TaskReport, AgentError> {
        let floor = assignment
            .operation
            .parse::<Operation>()
            .map(|op| self.settings.durations.for_operation(op))
            .unwrap_or_default();
        let min_duration = tokio::time::sleep(floor);

        let compute = self.compute;
        let operation = assignment.operation.clone();
        let args = assignment.args;
        let computed = match tokio::spawn(async move { compute(&operation, args) }).await {
            Ok(computed) => computed,
            Err(err) if err.is_panic() => {
                return Err(AgentError::ComputationPanicked {
                    task_id: assignment.id,
                    message: panic_message(err.into_panic()),
                });
            }
            Err(err) => {
                return Err(AgentError::ComputationAborted {
                    task_id: assignment.id,
                    message: err.to_string(),
                });
            }
        };

        match computed {
            Ok(value) => {
                min_duration.await;
                Ok(TaskReport::from_value(
                    assignment.id,
                    assignment.expression_id,
                    value,
                ))
            }
            Err(err) => Ok(TaskReport::failure(
                assignment.id,
                assignment.expression_id,
                err.to_string(),
            )),
        }
    }

    async fn pause(&self, cancel: &CancellationToken, duration: Duration) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
