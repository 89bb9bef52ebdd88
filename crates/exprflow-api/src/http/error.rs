//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use exprflow_types::error::ExpressionError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Expression submission or lookup errors.
    Expression(ExpressionError),
    /// Authentication failure.
    Unauthorized(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ExpressionError> for AppError {
    fn from(e: ExpressionError) -> Self {
        AppError::Expression(e)
    }
}

impl AppError {
    /// Status, machine-readable code and message for the envelope.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Expression(ExpressionError::Invalid(e)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.code(), e.to_string())
            }
            AppError::Expression(ExpressionError::NotFound) => (
                StatusCode::NOT_FOUND,
                "EXPRESSION_NOT_FOUND",
                "Expression not found".to_string(),
            ),
            AppError::Expression(e @ ExpressionError::StorageError(_)) => {
                tracing::error!(error = %e, "expression storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", e.to_string())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
