//! `calcn`: infix arithmetic with `+ - * / %`, parentheses, unary signs and
//! inline dice tokens.

use crate::ast::{CalcResult, Element, Node};
use crate::dice::{self, Roller};
use crate::error::EvalError;
use crate::grammar::DICE;
use crate::parser::parse;

const MAX_NESTING: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Number(f64),
    Operator(char),
    Open,
    Close,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(value) => value.to_string(),
            Token::Operator(op) => op.to_string(),
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
        }
    }
}

pub(crate) fn evaluate(element: &Element, roller: &mut Roller<'_>) -> Result<CalcResult, EvalError> {
    let [Node::Text { value: raw }] = element.attributes.as_slice() else {
        return Err(EvalError::CalcnShape);
    };

    let mut tokens = Vec::new();
    let mut expression = String::new();
    for node in parse(raw).children {
        match node {
            Node::Text { value } => {
                tokenize(&value, &mut tokens)?;
                expression.push_str(&value);
            }
            Node::Element(element) if element.is(DICE) => {
                let rolled = dice::resolve(&element, roller)?;
                tokens.push(Token::Number(rolled.result as f64));
                expression.push_str(&rolled.display());
            }
            Node::Element(element) => return Err(EvalError::UnsupportedTag(element.name)),
            Node::Nested { .. } => return Err(EvalError::CalcnShape),
        }
    }

    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
    };
    let mut result = parser.expression(0)?;
    if let Some(token) = tokens.get(parser.pos) {
        return Err(EvalError::UnexpectedToken(token.describe()));
    }
    if !result.is_finite() {
        return Err(EvalError::NonFinite);
    }
    // Drop the sign of negative zero.
    if result == 0.0 {
        result = 0.0;
    }
    Ok(CalcResult { expression, result })
}

fn tokenize(text: &str, tokens: &mut Vec<Token>) -> Result<(), EvalError> {
    let mut chars = text.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        match ch {
            ch if ch.is_whitespace() => {}
            '+' | '-' | '*' | '/' | '%' => tokens.push(Token::Operator(ch)),
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '0'..='9' | '.' => {
                let mut end = start + 1;
                let mut seen_dot = ch == '.';
                while let Some(&(idx, next)) = chars.peek() {
                    if next.is_ascii_digit() || (next == '.' && !seen_dot) {
                        seen_dot |= next == '.';
                        end = idx + 1;
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &text[start..end];
                let value = literal
                    .parse()
                    .map_err(|_| EvalError::NotANumber(literal.to_string()))?;
                tokens.push(Token::Number(value));
            }
            other => return Err(EvalError::UnexpectedToken(other.to_string())),
        }
    }
    Ok(())
}

struct ExprParser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl ExprParser<'_> {
    fn expression(&mut self, depth: usize) -> Result<f64, EvalError> {
        if depth > MAX_NESTING {
            return Err(EvalError::TooDeep);
        }
        let mut value = self.term(depth)?;
        while let Some(op @ ('+' | '-')) = self.peek_operator() {
            self.pos += 1;
            let rhs = self.term(depth)?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self, depth: usize) -> Result<f64, EvalError> {
        let mut value = self.unary(depth)?;
        while let Some(op @ ('*' | '/' | '%')) = self.peek_operator() {
            self.pos += 1;
            let rhs = self.unary(depth)?;
            value = match op {
                '*' => value * rhs,
                _ if rhs == 0.0 => return Err(EvalError::DivisionByZero),
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    fn unary(&mut self, depth: usize) -> Result<f64, EvalError> {
        match self.peek_operator() {
            Some(op @ ('+' | '-')) => {
                if depth >= MAX_NESTING {
                    return Err(EvalError::TooDeep);
                }
                self.pos += 1;
                let operand = self.unary(depth + 1)?;
                Ok(if op == '-' { -operand } else { operand })
            }
            _ => self.primary(depth),
        }
    }

    fn primary(&mut self, depth: usize) -> Result<f64, EvalError> {
        let token = *self.tokens.get(self.pos).ok_or(EvalError::UnexpectedEnd)?;
        self.pos += 1;
        match token {
            Token::Number(value) => Ok(value),
            Token::Open => {
                let value = self.expression(depth + 1)?;
                match self.tokens.get(self.pos) {
                    Some(Token::Close) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Some(other) => Err(EvalError::UnexpectedToken(other.describe())),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            other => Err(EvalError::UnexpectedToken(other.describe())),
        }
    }

    fn peek_operator(&self) -> Option<char> {
        match self.tokens.get(self.pos) {
            Some(Token::Operator(op)) => Some(*op),
            _ => None,
        }
    }
}
