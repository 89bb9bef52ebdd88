//! Arithmetic for a single task.

use exprflow_types::error::ComputeError;
use exprflow_types::task::Operation;

/// Apply `operation` (given by its wire symbol) to the task operands.
///
/// The first operand must always be present; binary operations also need the
/// second. Unary minus ignores slot 1 entirely.
pub fn calculate(operation: &str, args: [Option<f64>; 2]) -> Result<f64, ComputeError> {
    let op: Operation = operation
        .parse()
        .map_err(|_| ComputeError::UnknownOperation(operation.to_string()))?;

    let a = args[0].ok_or(ComputeError::MissingOperand(0))?;
    if op == Operation::Negate {
        return Ok(-a);
    }
    let b = args[1].ok_or(ComputeError::MissingOperand(1))?;

    match op {
        Operation::Add => Ok(a + b),
        Operation::Subtract => Ok(a - b),
        Operation::Multiply => Ok(a * b),
        Operation::Divide if b == 0.0 => Err(ComputeError::DivisionByZero),
        Operation::Divide => Ok(a / b),
        Operation::Power => Ok(a.powf(b)),
        Operation::Negate => unreachable!("handled above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_operations() {
        assert_eq!(calculate("+", [Some(2.0), Some(3.0)]), Ok(5.0));
        assert_eq!(calculate("-", [Some(2.0), Some(3.0)]), Ok(-1.0));
        assert_eq!(calculate("*", [Some(2.0), Some(3.0)]), Ok(6.0));
        assert_eq!(calculate("/", [Some(3.0), Some(2.0)]), Ok(1.5));
        assert_eq!(calculate("^", [Some(2.0), Some(10.0)]), Ok(1024.0));
    }

    #[test]
    fn test_negation_uses_first_operand_only() {
        assert_eq!(calculate("~", [Some(4.0), None]), Ok(-4.0));
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        assert_eq!(
            calculate("/", [Some(2.0), Some(0.0)]),
            Err(ComputeError::DivisionByZero)
        );
    }

    #[test]
    fn test_missing_operands() {
        assert_eq!(
            calculate("~", [None, None]),
            Err(ComputeError::MissingOperand(0))
        );
        assert_eq!(
            calculate("*", [Some(1.0), None]),
            Err(ComputeError::MissingOperand(1))
        );
    }

    #[test]
    fn test_unknown_operation() {
        assert_eq!(
            calculate("%", [Some(1.0), Some(1.0)]),
            Err(ComputeError::UnknownOperation("%".to_string()))
        );
    }

    #[test]
    fn test_large_power_overflows_to_infinity() {
        let result = calculate("^", [Some(1000.0), Some(1000.0)]).unwrap();
        assert!(result.is_infinite() && result.is_sign_positive());
    }
}
