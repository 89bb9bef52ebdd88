//! Character-level tokenizer for infix expressions.

/// A raw token, before unary minus is told apart from subtraction.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Digits, decimal points and an optional leading `+` sign, unparsed.
    Number(String),
    /// One of `+ - * / ^`.
    Operator(char),
    LeftParen,
    RightParen,
    /// Any other character. Passed through so that the graph builder can
    /// reject it as a malformed literal.
    Unknown(char),
}

pub(crate) fn is_operator_char(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '^')
}

/// Split an expression into tokens. Whitespace is ignored everywhere.
///
/// A `+` at the very start, right after another operator, or right after an
/// opening parenthesis is a sign and becomes part of the following number.
pub fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
    let mut tokens = Vec::new();
    let mut number = String::new();

    for (i, &c) in chars.iter().enumerate() {
        let sign_position = i == 0 || is_operator_char(chars[i - 1]) || chars[i - 1] == '(';

        if c.is_ascii_digit() || c == '.' || (c == '+' && sign_position) {
            number.push(c);
            continue;
        }

        if !number.is_empty() {
            tokens.push(Token::Number(std::mem::take(&mut number)));
        }

        tokens.push(match c {
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            c if is_operator_char(c) => Token::Operator(c),
            c => Token::Unknown(c),
        });
    }

    if !number.is_empty() {
        tokens.push(Token::Number(number));
    }

    tokens
}
