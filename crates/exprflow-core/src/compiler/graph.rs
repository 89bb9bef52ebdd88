//! Postfix to task graph conversion.
//!
//! Tasks live in an arena (`TaskGraph::tasks`) and refer to each other by
//! index. Indices become row ids only when the repository flushes the whole
//! graph in one transaction.

use exprflow_types::error::CompileError;
use exprflow_types::task::Operation;
use serde::Serialize;

use super::postfix::RpnToken;

/// A task that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledTask {
    pub operation: Operation,
    /// Literal operands known at compile time.
    pub args: [Option<f64>; 2],
    /// Arena indices of the tasks producing the remaining operands.
    pub dependencies: [Option<usize>; 2],
}

/// An expression compiled into tasks, in postfix evaluation order.
///
/// Every dependency points at a lower index, and the last task is the root
/// whose result is the value of the whole expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskGraph {
    tasks: Vec<CompiledTask>,
}

impl TaskGraph {
    pub fn tasks(&self) -> &[CompiledTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Arena index of the root task.
    pub fn root(&self) -> usize {
        self.tasks.len() - 1
    }
}

/// Operand on the builder stack.
enum Node {
    Literal(f64),
    Task(usize),
}

impl Node {
    fn place(self, task: &mut CompiledTask, slot: usize) {
        match self {
            Node::Literal(value) => task.args[slot] = Some(value),
            Node::Task(index) => task.dependencies[slot] = Some(index),
        }
    }
}

pub fn build_graph(postfix: &[RpnToken]) -> Result<TaskGraph, CompileError> {
    let mut tasks: Vec<CompiledTask> = Vec::new();
    let mut stack: Vec<Node> = Vec::new();

    for token in postfix {
        match token {
            RpnToken::Literal(text) => {
                let value = text.parse::<f64>().map_err(|_| {
                    CompileError::RpnConversion(format!("invalid number '{text}'"))
                })?;
                stack.push(Node::Literal(value));
            }
            RpnToken::Operator(Operation::Negate) => {
                let operand = stack.pop().ok_or(CompileError::UnaryMinusWithoutOperand)?;
                let mut task = CompiledTask {
                    operation: Operation::Negate,
                    args: [None, None],
                    dependencies: [None, None],
                };
                operand.place(&mut task, 0);
                tasks.push(task);
                stack.push(Node::Task(tasks.len() - 1));
            }
            RpnToken::Operator(op) => {
                let not_enough = || CompileError::NotEnoughOperands(op.symbol().to_string());
                let right = stack.pop().ok_or_else(not_enough)?;
                let left = stack.pop().ok_or_else(not_enough)?;
                let mut task = CompiledTask {
                    operation: *op,
                    args: [None, None],
                    dependencies: [None, None],
                };
                left.place(&mut task, 0);
                right.place(&mut task, 1);
                tasks.push(task);
                stack.push(Node::Task(tasks.len() - 1));
            }
        }
    }

    match stack.as_slice() {
        [Node::Task(_)] => Ok(TaskGraph { tasks }),
        [Node::Literal(_)] => Err(CompileError::RpnConversion(
            "expression has no operator".to_string(),
        )),
        nodes => Err(CompileError::RpnConversion(format!(
            "expected a single root, found {} operands",
            nodes.len()
        ))),
    }
}
