//! `exprflow agent`: a pool of polling workers.

use anyhow::Result;
use console::style;
use tokio_util::sync::CancellationToken;

use exprflow_core::worker::{Agent, WorkerSettings};
use exprflow_infra::rpc::HttpTaskTransport;
use exprflow_types::config::ServiceConfig;

/// Run workers against the orchestrator until Ctrl+C or a fatal worker error.
pub async fn run_agent(
    config: ServiceConfig,
    orchestrator_url: Option<String>,
    computing_power: Option<usize>,
) -> Result<()> {
    let url = orchestrator_url.unwrap_or_else(|| config.agent.orchestrator_url.clone());
    let computing_power = computing_power.unwrap_or(config.agent.computing_power);
    let settings = WorkerSettings::from_config(&config.agent, &config.durations);

    tracing::info!(
        orchestrator = %url,
        computing_power,
        durations = ?config.durations,
        "starting agent"
    );
    println!(
        "  {} exprflow agent with {} worker(s) polling {}",
        style("⚙").bold(),
        style(computing_power).bold(),
        style(&url).cyan()
    );

    let agent = Agent::new(HttpTaskTransport::new(url), settings, computing_power);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        crate::shutdown_signal().await;
        on_signal.cancel();
    });

    agent.run(cancel).await?;

    println!("\n  Agent stopped.");
    Ok(())
}
