//! `calc`: prefix S-expressions over `+ - * /`.

use crate::ast::{CalcResult, Element, Node};
use crate::dice::{self, Roller};
use crate::error::EvalError;
use crate::grammar::DICE;

pub(crate) fn evaluate(element: &Element, roller: &mut Roller<'_>) -> Result<CalcResult, EvalError> {
    let [Node::Nested { children }] = element.attributes.as_slice() else {
        return Err(EvalError::CalcShape);
    };
    let term = evaluate_group(children, roller)?;
    Ok(CalcResult {
        expression: term.text,
        result: term.value,
    })
}

struct Term {
    value: f64,
    text: String,
}

fn evaluate_group(children: &[Node], roller: &mut Roller<'_>) -> Result<Term, EvalError> {
    let Some((operator, operands)) = children.split_first() else {
        return Err(EvalError::CalcShape);
    };
    let operator = match operator.as_text() {
        Some("+") => '+',
        Some("-") => '-',
        Some("*") => '*',
        Some("/") => '/',
        Some(other) => return Err(EvalError::UnknownOperator(other.to_string())),
        None => return Err(EvalError::CalcShape),
    };
    if operands.is_empty() {
        return Err(EvalError::MissingOperand(operator));
    }

    let mut terms = Vec::with_capacity(operands.len());
    for operand in operands {
        terms.push(evaluate_operand(operand, roller)?);
    }

    let mut values = terms.iter().map(|term| term.value);
    let first = values.next().unwrap_or_default();
    let mut value = match operator {
        '+' => first + values.sum::<f64>(),
        '*' => first * values.product::<f64>(),
        '-' => values.fold(first, |acc, next| acc - next),
        _ => {
            let mut acc = first;
            for divisor in values {
                if divisor == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                acc /= divisor;
            }
            acc
        }
    };
    if !value.is_finite() {
        return Err(EvalError::NonFinite);
    }
    // Drop the sign of negative zero.
    if value == 0.0 {
        value = 0.0;
    }

    let separator = format!(" {operator} ");
    let text = terms
        .iter()
        .map(|term| term.text.as_str())
        .collect::<Vec<_>>()
        .join(&separator);
    Ok(Term { value, text })
}

fn evaluate_operand(operand: &Node, roller: &mut Roller<'_>) -> Result<Term, EvalError> {
    match operand {
        Node::Text { value } => {
            let number = parse_number(value).ok_or_else(|| EvalError::NotANumber(value.clone()))?;
            Ok(Term {
                value: number,
                text: value.clone(),
            })
        }
        Node::Nested { children } => {
            let inner = evaluate_group(children, roller)?;
            Ok(Term {
                value: inner.value,
                text: format!("({})", inner.text),
            })
        }
        Node::Element(element) if element.is(DICE) => {
            let rolled = dice::resolve(element, roller)?;
            Ok(Term {
                value: rolled.result as f64,
                text: rolled.display(),
            })
        }
        Node::Element(element) => Err(EvalError::UnsupportedTag(element.name.clone())),
    }
}

/// `-?[0-9]+(\.[0-9]+)?`. Rejects the `inf`/`NaN`/exponent forms `f64`
/// parsing would otherwise accept.
fn parse_number(text: &str) -> Option<f64> {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || fraction.is_some_and(|fraction| !digits(fraction)) {
        return None;
    }
    text.parse().ok()
}
