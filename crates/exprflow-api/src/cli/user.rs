//! `exprflow user` commands.

use anyhow::Result;
use console::style;

use exprflow_core::repository::user::UserRepository;

use crate::state::AppState;

/// Create a user and print its API key once.
pub async fn create_user(state: &AppState, name: &str, json: bool) -> Result<()> {
    let creds = state.users.create_user(name).await?;

    if json {
        let out = serde_json::json!({
            "user_id": creds.user_id,
            "name": name,
            "api_key": creds.api_key,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Created user {} (id {})",
        style("✓").green().bold(),
        style(name).cyan(),
        creds.user_id
    );
    println!();
    println!(
        "  {} API key (save this -- it won't be shown again):",
        style("🔑").bold()
    );
    println!();
    println!("  {}", style(&creds.api_key).yellow().bold());
    println!();
    Ok(())
}
