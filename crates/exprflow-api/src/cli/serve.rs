//! `exprflow serve`: the orchestrator process.

use anyhow::Result;
use console::style;

use crate::http;
use crate::state::AppState;

/// Bind the REST + RPC router and serve until Ctrl+C / SIGTERM.
pub async fn serve(state: AppState, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| state.config.orchestrator.host.clone());
    let port = port.unwrap_or(state.config.orchestrator.port);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, data_dir = %state.data_dir.display(), "orchestrator listening");
    println!(
        "  {} exprflow orchestrator listening on {}",
        style("⚡").bold(),
        style(format!("http://{addr}")).cyan()
    );
    println!("  {}", style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(crate::shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}
