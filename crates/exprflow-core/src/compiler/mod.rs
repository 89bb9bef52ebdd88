//! Expression compiler: infix string -> postfix tokens -> task graph.
//!
//! The pipeline has three stages, each in its own module:
//! - [`lexer`]: character scan into numbers, operators and parentheses.
//! - [`postfix`]: shunting-yard reordering, telling unary minus apart from
//!   subtraction.
//! - [`graph`]: stack walk over the postfix tokens that emits one task per
//!   operator and wires operands either as literals or as dependencies.

pub mod graph;
pub mod lexer;
pub mod postfix;

use exprflow_types::error::CompileError;

pub use graph::{CompiledTask, TaskGraph};

/// Compile an infix expression into its task graph.
pub fn compile(input: &str) -> Result<TaskGraph, CompileError> {
    let tokens = lexer::tokenize(input);
    let rpn = postfix::to_postfix(&tokens)?;
    let graph = graph::build_graph(&rpn)?;
    tracing::debug!(expression = input, tasks = graph.len(), "compiled expression");
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::calculate;
    use exprflow_types::task::Operation;

    /// Evaluate a graph in arena order, the same order a single worker
    /// would see tasks become ready.
    fn evaluate(graph: &TaskGraph) -> f64 {
        let mut results: Vec<f64> = Vec::with_capacity(graph.len());
        for task in graph.tasks() {
            let mut args = task.args;
            for (slot, dep) in task.dependencies.iter().enumerate() {
                if let Some(index) = dep {
                    args[slot] = Some(results[*index]);
                }
            }
            results.push(calculate(task.operation.symbol(), args).unwrap());
        }
        results[graph.root()]
    }

    #[test]
    fn test_single_addition() {
        let graph = compile("2 + 2").unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.tasks()[0].operation, Operation::Add);
        assert_eq!(graph.tasks()[0].args, [Some(2.0), Some(2.0)]);
        assert_eq!(evaluate(&graph), 4.0);
    }

    #[test]
    fn test_nested_expression_shape() {
        let graph = compile("2 + 3 * (4 - 1)").unwrap();
        let ops: Vec<Operation> = graph.tasks().iter().map(|t| t.operation).collect();
        assert_eq!(ops, vec![Operation::Subtract, Operation::Multiply, Operation::Add]);
        assert_eq!(graph.tasks()[1].args, [Some(3.0), None]);
        assert_eq!(graph.tasks()[1].dependencies, [None, Some(0)]);
        assert_eq!(graph.tasks()[2].dependencies, [None, Some(1)]);
        assert_eq!(evaluate(&graph), 11.0);
    }

    #[test]
    fn test_evaluation_matches_standard_precedence() {
        let cases = [
            ("1 + 2 * 3", 7.0),
            ("(1 + 2) * 3", 9.0),
            ("10 / 4 - 1", 1.5),
            ("8 - 4 - 2", 2.0),
            ("2 ^ 3 ^ 2", 64.0),
            ("-2 ^ 2", -4.0),
            ("2 * -3", -6.0),
            ("-(2 + 3) * 4", -20.0),
            ("+2 + +3", 5.0),
            ("0.5 * .5", 0.25),
            ("2 * 3 ^ 2", 18.0),
        ];
        for (input, expected) in cases {
            let graph = compile(input).unwrap();
            assert_eq!(evaluate(&graph), expected, "{input}");
        }
    }

    #[test]
    fn test_compile_errors() {
        assert_eq!(compile("2"), Err(CompileError::MinimumTwoOperands));
        assert_eq!(compile("(2 + 3"), Err(CompileError::UnclosedParenthesis));
        assert_eq!(compile("2 + 3)"), Err(CompileError::UnopenedParenthesis));
        assert_eq!(compile("2 +"), Err(CompileError::NotEnoughOperands("+".to_string())));
        assert_eq!(compile("--3"), Err(CompileError::UnaryMinusWithoutOperand));
        assert_eq!(compile("2 + x").unwrap_err().code(), "rpn-conversion-error");
        assert_eq!(compile("").unwrap_err().code(), "rpn-conversion-error");
        assert_eq!(compile("(2)(3)").unwrap_err().code(), "rpn-conversion-error");
        assert_eq!(compile("2 3"), Err(CompileError::MinimumTwoOperands));
    }

    #[test]
    fn test_power_of_negative_exponent_keeps_quirk() {
        assert_eq!(
            compile("2 ^ -3"),
            Err(CompileError::NotEnoughOperands("^".to_string()))
        );
        assert_eq!(evaluate(&compile("2 ^ (-3)").unwrap()), 0.125);
    }
}
