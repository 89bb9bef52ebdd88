use thiserror::Error;

use crate::task::TaskId;

/// Errors raised while compiling an infix string into a task graph.
///
/// The submitting client sees these; no expression is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("closing parenthesis without a matching opening one")]
    UnopenedParenthesis,

    #[error("opening parenthesis is never closed")]
    UnclosedParenthesis,

    #[error("expression needs at least one operator and two operands")]
    MinimumTwoOperands,

    #[error("not enough operands for operator '{0}'")]
    NotEnoughOperands(String),

    #[error("unary minus without operand")]
    UnaryMinusWithoutOperand,

    #[error("cannot convert postfix form: {0}")]
    RpnConversion(String),
}

impl CompileError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::UnopenedParenthesis => "unopened-parenthesis",
            CompileError::UnclosedParenthesis => "unclosed-parenthesis",
            CompileError::MinimumTwoOperands => "minimum-two-operands",
            CompileError::NotEnoughOperands(_) => "not-enough-operands",
            CompileError::UnaryMinusWithoutOperand => "unary-minus-without-operand",
            CompileError::RpnConversion(_) => "rpn-conversion-error",
        }
    }
}

/// Errors from evaluating a single task. They fail the owning expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("operand {0} is missing")]
    MissingOperand(usize),

    #[error("unknown operation: '{0}'")]
    UnknownOperation(String),
}

/// Errors from repository operations (used by trait definitions in exprflow-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the scheduler's transactional operations.
///
/// Any of these aborts the current call; the transaction is rolled back.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error("task {task_id} has no value and no dependency for operand {slot}")]
    UnresolvableOperand { task_id: TaskId, slot: usize },
}

/// Errors surfaced by the expression service to the HTTP and CLI layers.
#[derive(Debug, Error)]
pub enum ExpressionError {
    #[error("invalid expression: {0}")]
    Invalid(#[from] CompileError),

    #[error("expression not found")]
    NotFound,

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors talking to the orchestrator over RPC.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("orchestrator responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed payload: {0}")]
    Codec(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_codes() {
        assert_eq!(CompileError::UnopenedParenthesis.code(), "unopened-parenthesis");
        assert_eq!(CompileError::MinimumTwoOperands.code(), "minimum-two-operands");
        assert_eq!(
            CompileError::NotEnoughOperands("^".to_string()).code(),
            "not-enough-operands"
        );
        assert_eq!(
            CompileError::RpnConversion("bad literal".to_string()).code(),
            "rpn-conversion-error"
        );
    }

    #[test]
    fn test_compute_error_display() {
        assert_eq!(ComputeError::DivisionByZero.to_string(), "division by zero");
        assert_eq!(
            ComputeError::UnknownOperation("%".to_string()).to_string(),
            "unknown operation: '%'"
        );
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_scheduler_error_wraps_repository() {
        let err: SchedulerError = RepositoryError::NotFound.into();
        assert_eq!(err.to_string(), "storage error: entity not found");
    }
}
