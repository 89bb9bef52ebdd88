//! Worker pool.
//!
//! Spawns `computing_power` independent [`Worker`] loops sharing one
//! transport. The pool stops when the caller's token is cancelled or when any
//! worker reports a fatal error, in which case the remaining workers are
//! cancelled and the error is returned.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::runner::{Worker, WorkerSettings};
use super::transport::TaskTransport;
use super::AgentError;

pub struct Agent<T: TaskTransport> {
    transport: Arc<T>,
    settings: WorkerSettings,
    computing_power: usize,
    #[cfg(test)]
    compute: Option<super::runner::ComputeFn>,
}

impl<T: TaskTransport + 'static> Agent<T> {
    pub fn new(transport: T, settings: WorkerSettings, computing_power: usize) -> Self {
        Self {
            transport: Arc::new(transport),
            settings,
            computing_power,
            #[cfg(test)]
            compute: None,
        }
    }

    #[cfg(test)]
    fn with_compute(mut self, compute: super::runner::ComputeFn) -> Self {
        self.compute = Some(compute);
        self
    }

    /// Run every worker until `cancel` fires or one of them fails fatally.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), AgentError> {
        if self.computing_power == 0 {
            tracing::warn!("computing power is 0, no workers started");
            return Ok(());
        }

        let (fatal_tx, mut fatal_rx) = mpsc::channel(self.computing_power);
        let workers = cancel.child_token();
        let mut set = JoinSet::new();

        for id in 0..self.computing_power {
            let worker = Worker::new(
                id,
                Arc::clone(&self.transport),
                self.settings.clone(),
                fatal_tx.clone(),
            );
            #[cfg(test)]
            let worker = match self.compute {
                Some(compute) => worker.with_compute(compute),
                None => worker,
            };
            set.spawn(worker.run(workers.clone()));
        }
        drop(fatal_tx);

        tracing::info!(workers = self.computing_power, "agent started");

        let fatal = tokio::select! {
            _ = cancel.cancelled() => None,
            err = fatal_rx.recv() => err,
        };

        workers.cancel();
        while let Some(joined) = set.join_next().await {
            if let Err(err) = joined {
                tracing::warn!(error = %err, "worker task ended abnormally");
            }
        }

        match fatal {
            Some(err) => {
                tracing::error!(error = %err, "agent stopped after fatal error");
                Err(err)
            }
            None => {
                tracing::info!("agent stopped");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use exprflow_types::config::OperationDurations;
    use exprflow_types::error::ComputeError;
    use exprflow_types::rpc::TaskAssignment;
    use std::time::Duration;

    fn settings() -> WorkerSettings {
        WorkerSettings {
            poll_interval: Duration::from_millis(50),
            error_backoff: Duration::from_millis(200),
            durations: OperationDurations::uniform(100),
        }
    }

    fn assignment(id: i64) -> TaskAssignment {
        TaskAssignment {
            id,
            args: [Some(id as f64), Some(1.0)],
            operation: "+".to_string(),
            expression_id: id,
            error: String::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_workers_share_the_queue() {
        let transport = ScriptedTransport::default();
        for id in 1..=6 {
            transport.push(Ok(Some(assignment(id)))).await;
        }
        let agent = Agent::new(transport, settings(), 3);

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            stopper.cancel();
        });

        agent.run(cancel).await.unwrap();

        let mut results: Vec<f64> = agent
            .transport
            .reports()
            .await
            .iter()
            .map(|r| r.result)
            .collect();
        results.sort_by(f64::total_cmp);
        assert_eq!(results, vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_stops_every_worker() {
        fn explode(_: &str, _: [Option<f64>; 2]) -> Result<f64, ComputeError> {
            panic!("boom")
        }

        let transport = ScriptedTransport::default();
        transport.push(Ok(Some(assignment(1)))).await;
        let agent = Agent::new(transport, settings(), 4).with_compute(explode);

        let err = agent.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::ComputationPanicked { task_id: 1, .. }));
    }

    #[tokio::test]
    async fn test_zero_computing_power_returns_immediately() {
        let agent = Agent::new(ScriptedTransport::default(), settings(), 0);
        agent.run(CancellationToken::new()).await.unwrap();
    }
}
