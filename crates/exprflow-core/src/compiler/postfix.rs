//! Infix to postfix conversion (shunting-yard with unary minus detection).

use exprflow_types::error::CompileError;
use exprflow_types::task::Operation;

use super::lexer::Token;

/// A token in postfix order.
#[derive(Debug, Clone, PartialEq)]
pub enum RpnToken {
    /// Literal text, parsed later by the graph builder.
    Literal(String),
    Operator(Operation),
}

enum StackEntry {
    LeftParen,
    Operator(Operation),
}

/// Binding strength. Unary minus sits below `^`, so `2 ^ -3` pops the power
/// before its right operand exists and later fails for lack of operands.
fn precedence(op: Operation) -> u8 {
    match op {
        Operation::Add | Operation::Subtract => 1,
        Operation::Multiply | Operation::Divide => 2,
        Operation::Negate => 3,
        Operation::Power => 4,
    }
}

fn binary_operation(c: char) -> Option<Operation> {
    match c {
        '+' => Some(Operation::Add),
        '-' => Some(Operation::Subtract),
        '*' => Some(Operation::Multiply),
        '/' => Some(Operation::Divide),
        '^' => Some(Operation::Power),
        _ => None,
    }
}

/// `-` is unary when it opens the expression or follows `(` or another
/// operator. The check looks at the raw previous token, so a preceding unary
/// minus still counts as an operator.
fn is_unary_minus(tokens: &[Token], index: usize) -> bool {
    if tokens[index] != Token::Operator('-') {
        return false;
    }
    index == 0 || matches!(tokens[index - 1], Token::Operator(_) | Token::LeftParen)
}

/// Reorder tokens into postfix form.
///
/// Operators of equal precedence associate to the left, `^` included.
pub fn to_postfix(tokens: &[Token]) -> Result<Vec<RpnToken>, CompileError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<StackEntry> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::Number(text) => output.push(RpnToken::Literal(text.clone())),
            Token::Unknown(c) => output.push(RpnToken::Literal(c.to_string())),
            Token::LeftParen => stack.push(StackEntry::LeftParen),
            Token::RightParen => loop {
                match stack.pop() {
                    Some(StackEntry::Operator(op)) => output.push(RpnToken::Operator(op)),
                    Some(StackEntry::LeftParen) => break,
                    None => return Err(CompileError::UnopenedParenthesis),
                }
            },
            Token::Operator(c) => {
                let op = if is_unary_minus(tokens, index) {
                    Operation::Negate
                } else {
                    binary_operation(*c).ok_or_else(|| {
                        CompileError::RpnConversion(format!("unsupported operator '{c}'"))
                    })?
                };

                while let Some(StackEntry::Operator(top)) = stack.last() {
                    if precedence(op) > precedence(*top) {
                        break;
                    }
                    output.push(RpnToken::Operator(*top));
                    stack.pop();
                }
                stack.push(StackEntry::Operator(op));
            }
        }
    }

    while let Some(entry) = stack.pop() {
        match entry {
            StackEntry::Operator(op) => output.push(RpnToken::Operator(op)),
            StackEntry::LeftParen => return Err(CompileError::UnclosedParenthesis),
        }
    }

    if output.len() == 1 {
        return Err(CompileError::MinimumTwoOperands);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::tokenize;

    fn rpn(input: &str) -> Result<String, CompileError> {
        let tokens = to_postfix(&tokenize(input))?;
        Ok(tokens
            .iter()
            .map(|t| match t {
                RpnToken::Literal(s) => s.clone(),
                RpnToken::Operator(op) => op.symbol().to_string(),
            })
            .collect::<Vec<_>>()
            .join(" "))
    }

    #[test]
    fn test_precedence_and_parentheses() {
        assert_eq!(rpn("2 + 3 * (4 - 1)").unwrap(), "2 3 4 1 - * +");
        assert_eq!(rpn("2 * 3 + 4").unwrap(), "2 3 * 4 +");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(rpn("8 - 4 - 2").unwrap(), "8 4 - 2 -");
        assert_eq!(rpn("2 ^ 3 ^ 2").unwrap(), "2 3 ^ 2 ^");
    }

    #[test]
    fn test_unary_minus_detection() {
        assert_eq!(rpn("-2 + 3").unwrap(), "2 ~ 3 +");
        assert_eq!(rpn("2 * -3").unwrap(), "2 3 ~ *");
        assert_eq!(rpn("(-2)").unwrap(), "2 ~");
        assert_eq!(rpn("-2 ^ 2").unwrap(), "2 2 ^ ~");
    }

    #[test]
    fn test_power_is_popped_by_following_unary_minus() {
        assert_eq!(rpn("2 ^ -3").unwrap(), "2 ^ 3 ~");
    }

    #[test]
    fn test_parenthesis_errors() {
        assert_eq!(rpn("2 + 3)"), Err(CompileError::UnopenedParenthesis));
        assert_eq!(rpn("(2 + 3"), Err(CompileError::UnclosedParenthesis));
    }

    #[test]
    fn test_single_literal_is_rejected() {
        assert_eq!(rpn("2"), Err(CompileError::MinimumTwoOperands));
        assert_eq!(rpn("(7)"), Err(CompileError::MinimumTwoOperands));
    }
}
