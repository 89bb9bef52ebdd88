//! Service configuration types for exprflow.
//!
//! `ServiceConfig` represents the top-level `config.toml` shared by the
//! orchestrator and the agent. Every field has a default, so an empty file
//! (or no file at all) is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::task::Operation;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    /// Minimum reported duration per operation.
    #[serde(default)]
    pub durations: OperationDurations,
}

/// Where the orchestrator listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Number of independent polling loops.
    #[serde(default = "default_computing_power")]
    pub computing_power: usize,

    /// Base URL of the orchestrator RPC endpoints.
    #[serde(default = "default_orchestrator_url")]
    pub orchestrator_url: String,

    /// Sleep between polls while no task is ready.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Sleep after a failed RPC before trying again.
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
}

fn default_computing_power() -> usize {
    4
}

fn default_orchestrator_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_error_backoff_ms() -> u64 {
    1_000
}

impl AgentConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            computing_power: default_computing_power(),
            orchestrator_url: default_orchestrator_url(),
            poll_interval_ms: default_poll_interval_ms(),
            error_backoff_ms: default_error_backoff_ms(),
        }
    }
}

/// Per-operation latency floor in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDurations {
    #[serde(default = "default_duration_ms")]
    pub addition_ms: u64,
    #[serde(default = "default_duration_ms")]
    pub subtraction_ms: u64,
    #[serde(default = "default_duration_ms")]
    pub multiplication_ms: u64,
    #[serde(default = "default_duration_ms")]
    pub division_ms: u64,
    #[serde(default = "default_duration_ms")]
    pub power_ms: u64,
    #[serde(default = "default_duration_ms")]
    pub negation_ms: u64,
}

fn default_duration_ms() -> u64 {
    1_000
}

impl OperationDurations {
    /// All six floors set to the same value.
    pub fn uniform(ms: u64) -> Self {
        Self {
            addition_ms: ms,
            subtraction_ms: ms,
            multiplication_ms: ms,
            division_ms: ms,
            power_ms: ms,
            negation_ms: ms,
        }
    }

    pub fn for_operation(&self, op: Operation) -> Duration {
        let ms = match op {
            Operation::Add => self.addition_ms,
            Operation::Subtract => self.subtraction_ms,
            Operation::Multiply => self.multiplication_ms,
            Operation::Divide => self.division_ms,
            Operation::Power => self.power_ms,
            Operation::Negate => self.negation_ms,
        };
        Duration::from_millis(ms)
    }
}

impl Default for OperationDurations {
    fn default() -> Self {
        Self::uniform(default_duration_ms())
    }
}
