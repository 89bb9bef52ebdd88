//! Service configuration loader for exprflow.
//!
//! Reads `config.toml` from the data directory (`~/.exprflow/` in production)
//! and deserializes it into [`ServiceConfig`]. Falls back to defaults when the
//! file is missing or malformed. Environment variables are applied on top.

use std::path::Path;
use std::str::FromStr;

use exprflow_types::config::ServiceConfig;

/// Environment variables that override configured values.
pub const ENV_COMPUTING_POWER: &str = "COMPUTING_POWER";
pub const ENV_TIME_ADDITION: &str = "TIME_ADDITION_MS";
pub const ENV_TIME_SUBTRACTION: &str = "TIME_SUBTRACTION_MS";
pub const ENV_TIME_MULTIPLICATION: &str = "TIME_MULTIPLICATIONS_MS";
pub const ENV_TIME_DIVISION: &str = "TIME_DIVISIONS_MS";
pub const ENV_TIME_POWER: &str = "TIME_POWER_MS";
pub const ENV_TIME_NEGATION: &str = "TIME_NEGATION_MS";

/// Load service configuration from `{data_dir}/config.toml`, then apply
/// environment overrides.
pub async fn load_service_config(data_dir: &Path) -> ServiceConfig {
    let mut config = read_config_file(data_dir).await;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

/// Parse `{data_dir}/config.toml` without looking at the environment.
///
/// - If the file does not exist, returns [`ServiceConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn read_config_file(data_dir: &Path) -> ServiceConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
    };

    match toml::from_str::<ServiceConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServiceConfig::default()
        }
    }
}

/// Apply environment overrides read through `lookup`.
///
/// Unparseable values are logged and ignored.
pub fn apply_env_overrides(config: &mut ServiceConfig, lookup: impl Fn(&str) -> Option<String>) {
    override_from(&lookup, ENV_COMPUTING_POWER, &mut config.agent.computing_power);

    let durations = &mut config.durations;
    override_from(&lookup, ENV_TIME_ADDITION, &mut durations.addition_ms);
    override_from(&lookup, ENV_TIME_SUBTRACTION, &mut durations.subtraction_ms);
    override_from(&lookup, ENV_TIME_MULTIPLICATION, &mut durations.multiplication_ms);
    override_from(&lookup, ENV_TIME_DIVISION, &mut durations.division_ms);
    override_from(&lookup, ENV_TIME_POWER, &mut durations.power_ms);
    override_from(&lookup, ENV_TIME_NEGATION, &mut durations.negation_ms);
}

fn override_from<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    target: &mut T,
) {
    let Some(raw) = lookup(name) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => tracing::warn!(variable = name, value = raw.as_str(), "ignoring invalid value"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use exprflow_types::task::Operation;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[tokio::test]
    async fn read_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = read_config_file(tmp.path()).await;
        assert_eq!(config, ServiceConfig::default());
    }

    #[tokio::test]
    async fn read_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[orchestrator]
port = 9090

[agent]
computing_power = 8
orchestrator_url = "http://10.0.0.5:9090"

[durations]
power_ms = 2500
"#,
        )
        .await
        .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.orchestrator.port, 9090);
        assert_eq!(config.orchestrator.host, "127.0.0.1");
        assert_eq!(config.agent.computing_power, 8);
        assert_eq!(config.agent.orchestrator_url, "http://10.0.0.5:9090");
        assert_eq!(
            config.durations.for_operation(Operation::Power),
            Duration::from_millis(2500)
        );
        assert_eq!(config.durations.addition_ms, 1000);
    }

    #[tokio::test]
    async fn read_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn env_overrides_replace_values() {
        let mut config = ServiceConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("COMPUTING_POWER", "12"),
                ("TIME_ADDITION_MS", "10"),
                ("TIME_MULTIPLICATIONS_MS", " 30 "),
                ("TIME_NEGATION_MS", "5"),
            ]),
        );

        assert_eq!(config.agent.computing_power, 12);
        assert_eq!(config.durations.addition_ms, 10);
        assert_eq!(config.durations.multiplication_ms, 30);
        assert_eq!(config.durations.negation_ms, 5);
        assert_eq!(config.durations.division_ms, 1000);
    }

    #[test]
    fn env_overrides_ignore_garbage() {
        let mut config = ServiceConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("COMPUTING_POWER", "lots"), ("TIME_POWER_MS", "-1")]),
        );
        assert_eq!(config, ServiceConfig::default());
    }
}
