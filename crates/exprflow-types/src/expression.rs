use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Row id of a persisted expression.
pub type ExpressionId = i64;

/// Numeric id of the user owning an expression. Resolved from credentials
/// before a request reaches the core.
pub type UserId = i64;

/// A user-submitted arithmetic string and its aggregate evaluation state.
///
/// The row outlives its tasks: once the expression completes or fails, the
/// tasks are deleted and this record keeps the result or error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub id: ExpressionId,
    pub user_id: UserId,
    pub expression: String,
    pub status: ExpressionStatus,
    pub result: Option<f64>,
    /// Human-readable failure reason (empty unless `status` is `error`).
    pub error: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Expression lifecycle: pending -> processing -> {completed, error}.
///
/// Transitions are monotonic; a terminal status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ExpressionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExpressionStatus::Completed | ExpressionStatus::Error)
    }
}

impl fmt::Display for ExpressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionStatus::Pending => write!(f, "pending"),
            ExpressionStatus::Processing => write!(f, "processing"),
            ExpressionStatus::Completed => write!(f, "completed"),
            ExpressionStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for ExpressionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ExpressionStatus::Pending),
            "processing" => Ok(ExpressionStatus::Processing),
            "completed" => Ok(ExpressionStatus::Completed),
            "error" => Ok(ExpressionStatus::Error),
            other => Err(format!("invalid expression status: '{other}'")),
        }
    }
}

/// Body of a submit request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitExpressionRequest {
    pub expression: String,
}
