//! Wire types exchanged between the orchestrator and its workers.
//!
//! Both messages are MessagePack-encoded in the HTTP bodies of the two RPC
//! endpoints. The operation travels as its symbol string so that a worker
//! can report an unknown tag as a task failure instead of rejecting the
//! payload.

use serde::{Deserialize, Serialize};

use crate::expression::ExpressionId;
use crate::task::{Task, TaskId};

/// Content type used by both RPC endpoints.
pub const RPC_CONTENT_TYPE: &str = "application/msgpack";

/// Path of the task polling endpoint.
pub const GET_TASK_PATH: &str = "/rpc/v1/get-task";

/// Path of the result submission endpoint.
pub const SUBMIT_RESULT_PATH: &str = "/rpc/v1/submit-result";

/// Response of `GetTask`. An `id` of 0 means no task is ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub id: TaskId,
    pub args: [Option<f64>; 2],
    pub operation: String,
    pub expression_id: ExpressionId,
    #[serde(default)]
    pub error: String,
}

impl TaskAssignment {
    /// The "no task available" sentinel.
    pub fn none() -> Self {
        Self {
            id: 0,
            args: [None, None],
            operation: String::new(),
            expression_id: 0,
            error: String::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.id == 0
    }
}

impl From<&Task> for TaskAssignment {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            args: task.args,
            operation: task.operation.symbol().to_string(),
            expression_id: task.expression_id,
            error: String::new(),
        }
    }
}

/// Failure message for a result the store cannot hold, if any.
pub fn non_finite_error(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("result is NaN")
    } else if value == f64::INFINITY {
        Some("result is +Inf")
    } else if value == f64::NEG_INFINITY {
        Some("result is -Inf")
    } else {
        None
    }
}

/// Request of `SubmitResult`. A non-empty `error` fails the whole expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub id: TaskId,
    pub expression_id: ExpressionId,
    pub result: f64,
    #[serde(default)]
    pub error: String,
}

impl TaskReport {
    pub fn success(id: TaskId, expression_id: ExpressionId, result: f64) -> Self {
        Self {
            id,
            expression_id,
            result,
            error: String::new(),
        }
    }

    /// A success report, or a failure when `result` is not finite.
    pub fn from_value(id: TaskId, expression_id: ExpressionId, result: f64) -> Self {
        match non_finite_error(result) {
            Some(error) => Self::failure(id, expression_id, error),
            None => Self::success(id, expression_id, result),
        }
    }

    pub fn failure(id: TaskId, expression_id: ExpressionId, error: impl Into<String>) -> Self {
        Self {
            id,
            expression_id,
            result: 0.0,
            error: error.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        !self.error.is_empty()
    }
}
