//! Data directory layout for exprflow.
//!
//! The data directory holds `config.toml` and the SQLite database.

use std::path::{Path, PathBuf};

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "EXPRFLOW_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `EXPRFLOW_DATA_DIR` environment variable
/// 2. `~/.exprflow`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".exprflow");
    }

    // Last resort: current directory
    PathBuf::from(".exprflow")
}

/// Create the data directory if it does not exist yet.
pub async fn ensure_data_dir(data_dir: &Path) -> Result<(), std::io::Error> {
    tokio::fs::create_dir_all(data_dir).await
}
