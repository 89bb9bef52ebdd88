//! HTTP client for the orchestrator's task RPCs.
//!
//! Implements `TaskTransport` from `exprflow-core`. Requests and responses
//! are MessagePack bodies (`rmp-serde`, named fields) posted to the
//! orchestrator's `/rpc/v1/*` endpoints.

use std::time::Duration;

use exprflow_core::worker::TaskTransport;
use exprflow_types::error::TransportError;
use exprflow_types::rpc::{
    GET_TASK_PATH, RPC_CONTENT_TYPE, SUBMIT_RESULT_PATH, TaskAssignment, TaskReport,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Per-request timeout. The orchestrator answers both RPCs without waiting
/// on workers, so anything slower is a stuck connection.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Encode an RPC message.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, TransportError> {
    rmp_serde::to_vec_named(message).map_err(|e| TransportError::Codec(e.to_string()))
}

/// Decode an RPC message.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, TransportError> {
    rmp_serde::from_slice(bytes).map_err(|e| TransportError::Codec(e.to_string()))
}

/// reqwest-backed `TaskTransport`.
pub struct HttpTaskTransport {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTaskTransport {
    /// Create a client for the orchestrator at `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("exprflow-agent/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(&self, path: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, RPC_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl TaskTransport for HttpTaskTransport {
    async fn get_task(&self) -> Result<Option<TaskAssignment>, TransportError> {
        let bytes = self.call(GET_TASK_PATH, Vec::new()).await?;
        let assignment: TaskAssignment = decode(&bytes)?;

        if assignment.is_none() {
            Ok(None)
        } else {
            Ok(Some(assignment))
        }
    }

    async fn submit_result(&self, report: &TaskReport) -> Result<(), TransportError> {
        self.call(SUBMIT_RESULT_PATH, encode(report)?).await?;
        Ok(())
    }
}
