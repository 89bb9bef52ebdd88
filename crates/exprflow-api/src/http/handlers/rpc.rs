//! Binary RPC endpoints polled by agents.
//!
//! Bodies are MessagePack, not the JSON envelope. Scheduler failures become a
//! plain-text 500 so the agent backs off and retries; undecodable requests
//! become a 400.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use exprflow_infra::rpc::{decode, encode};
use exprflow_types::rpc::{RPC_CONTENT_TYPE, TaskAssignment, TaskReport};

use crate::state::AppState;

fn msgpack(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, RPC_CONTENT_TYPE)], bytes).into_response()
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain")], message).into_response()
}

/// POST /rpc/v1/get-task - Claim one ready task (`id == 0` when none is).
pub async fn get_task(State(state): State<AppState>) -> Response {
    let assignment = match state.scheduler.read_task().await {
        Ok(Some(task)) => TaskAssignment::from(&task),
        Ok(None) => TaskAssignment::none(),
        Err(e) => {
            tracing::error!(error = %e, "failed to read task");
            return failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    match encode(&assignment) {
        Ok(bytes) => msgpack(bytes),
        Err(e) => failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// POST /rpc/v1/submit-result - Apply a worker's report.
pub async fn submit_result(State(state): State<AppState>, body: Bytes) -> Response {
    let report: TaskReport = match decode(&body) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting malformed task report");
            return failure(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    tracing::debug!(
        task_id = report.id,
        expression_id = report.expression_id,
        failed = report.is_failure(),
        "task report received"
    );

    match state.scheduler.complete_task(&report).await {
        Ok(()) => msgpack(Vec::new()),
        Err(e) => {
            tracing::error!(task_id = report.id, error = %e, "failed to complete task");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
