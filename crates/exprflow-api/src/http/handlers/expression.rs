//! Expression handlers for the REST API.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;

use exprflow_types::expression::{Expression, ExpressionId, ExpressionStatus, SubmitExpressionRequest};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Read-only projection of an expression returned to its owner.
#[derive(Debug, Serialize)]
pub struct ExpressionView {
    pub id: ExpressionId,
    pub expression: String,
    pub status: ExpressionStatus,
    pub result: Option<f64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Expression> for ExpressionView {
    fn from(e: Expression) -> Self {
        Self {
            id: e.id,
            expression: e.expression,
            status: e.status,
            result: e.result,
            error: e.error,
            created_at: e.created_at.to_rfc3339(),
            updated_at: e.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: ExpressionId,
}

fn self_link(id: ExpressionId) -> String {
    format!("/api/v1/expressions/{id}")
}

/// POST /api/v1/calculate - Compile and enqueue an expression.
pub async fn calculate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SubmitExpressionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Created>>), AppError> {
    let timer = RequestTimer::start();

    let expression = state
        .expression_service
        .submit(user_id, &body.expression)
        .await?;

    let resp = timer
        .respond(Created { id: expression.id })
        .with_link("self", &self_link(expression.id));

    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/expressions - List the caller's expressions, newest first.
pub async fn list_expressions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ApiResponse<Vec<ExpressionView>>>, AppError> {
    let timer = RequestTimer::start();

    let expressions = state.expression_service.list(user_id).await?;
    let views = expressions.into_iter().map(ExpressionView::from).collect();

    Ok(Json(timer.respond(views).with_link("self", "/api/v1/expressions")))
}

/// GET /api/v1/expressions/{id} - One of the caller's expressions.
pub async fn get_expression(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<ExpressionId>,
) -> Result<Json<ApiResponse<ExpressionView>>, AppError> {
    let timer = RequestTimer::start();

    let expression = state.expression_service.get(user_id, id).await?;

    Ok(Json(
        timer
            .respond(ExpressionView::from(expression))
            .with_link("self", &self_link(id)),
    ))
}
