use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::expression::ExpressionId;

/// Row id of a persisted task. Ids start at 1; 0 is reserved on the wire for
/// "no task available".
pub type TaskId = i64;

/// One atomic arithmetic operation inside an expression's dependency graph.
///
/// `args[i]` is `Some` when the operand is a literal or has already been
/// resolved from a completed dependency. When it is `None`, `dependencies[i]`
/// names the task whose result will fill it. Negation tasks never populate
/// slot 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub expression_id: ExpressionId,
    pub operation: Operation,
    pub args: [Option<f64>; 2],
    pub dependencies: [Option<TaskId>; 2],
    pub status: TaskStatus,
    pub result: Option<f64>,
}

impl Task {
    /// Slots that must hold a value before the task can run.
    pub fn operand_slots(&self) -> std::ops::Range<usize> {
        0..self.operation.arity()
    }
}

/// Task lifecycle: pending -> processing -> completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!("invalid task status: '{other}'")),
        }
    }
}

/// The supported operators.
///
/// Stored and sent over the wire as their symbol (`+ - * / ^`), with `~`
/// standing for unary minus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Negate,
}

impl Operation {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
            Operation::Power => "^",
            Operation::Negate => "~",
        }
    }

    /// Number of operand slots the operation reads.
    pub fn arity(&self) -> usize {
        match self {
            Operation::Negate => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Operation::Add),
            "-" => Ok(Operation::Subtract),
            "*" => Ok(Operation::Multiply),
            "/" => Ok(Operation::Divide),
            "^" => Ok(Operation::Power),
            "~" => Ok(Operation::Negate),
            other => Err(format!("unknown operation: '{other}'")),
        }
    }
}

impl TryFrom<String> for Operation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operation> for String {
    fn from(op: Operation) -> Self {
        op.symbol().to_string()
    }
}
