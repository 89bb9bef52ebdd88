//! exprflow CLI, orchestrator, and agent entry point.
//!
//! Binary name: `exprflow`
//!
//! Parses CLI arguments, sets up tracing, then either runs one of the
//! long-lived roles (`serve`, `agent`) or a one-shot command against the
//! local database.

mod cli;
mod http;
mod state;

use clap::Parser;

use cli::{Cli, Commands, UserAction};
use exprflow_infra::config::load_service_config;
use exprflow_infra::filesystem::resolve_data_dir;
use exprflow_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = TracingOptions {
        default_filter: cli.log_filter().to_string(),
        json: cli.log_json,
        otel: cli.otel,
    };
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        // The agent only talks to the orchestrator over HTTP; it never opens the database.
        Commands::Agent {
            orchestrator_url,
            computing_power,
        } => {
            let config = load_service_config(&resolve_data_dir()).await;
            cli::agent::run_agent(config, orchestrator_url, computing_power).await?;
        }

        Commands::Check { expression } => {
            cli::expression::check(&expression, cli.json)?;
        }

        command => {
            let state = AppState::init().await?;
            match command {
                Commands::Serve { port, host } => {
                    cli::serve::serve(state, host, port).await?;
                }
                Commands::User { action } => match action {
                    UserAction::Create { name } => {
                        cli::user::create_user(&state, &name, cli.json).await?;
                    }
                },
                Commands::Submit { expression, user } => {
                    cli::expression::submit(&state, user, &expression, cli.json).await?;
                }
                Commands::List { user } => {
                    cli::expression::list(&state, user, cli.json).await?;
                }
                Commands::Show { id, user } => {
                    cli::expression::show(&state, user, id, cli.json).await?;
                }
                Commands::Agent { .. } | Commands::Check { .. } => unreachable!("handled above"),
            }
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
