//! Dice classification and resolution, shared by the write and read paths.

use crate::ast::{DiceResult, Element, Node};
use crate::error::EvalError;
use crate::random::RandomSource;

/// What a well-formed `dice` element holds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum DiceState {
    /// `[dice min max]`, not rolled yet.
    Fresh { min: i64, max: i64 },
    /// `[dice min max]result[/dice]`, rolled at write time.
    Stored(DiceResult),
}

/// Threads an optional random source through evaluation and counts rolls.
pub(crate) struct Roller<'r> {
    random: Option<&'r mut dyn RandomSource>,
}

impl<'r> Roller<'r> {
    pub(crate) fn new(random: Option<&'r mut dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Exactly one call into the random source per fresh dice.
    pub(crate) fn roll(&mut self, min: i64, max: i64) -> Result<i64, EvalError> {
        let random = self.random.as_mut().ok_or(EvalError::NoRandomSource)?;
        Ok(random.roll(min, max).clamp(min, max))
    }
}

pub(crate) fn classify(element: &Element) -> Result<DiceState, EvalError> {
    let (min, max) = bounds(&element.attributes)?;
    match element.children.as_slice() {
        [] => Ok(DiceState::Fresh { min, max }),
        [Node::Text { value }] => {
            let result: i64 = value.parse().map_err(|_| EvalError::StoredMalformed)?;
            if result < min || result > max {
                return Err(EvalError::StoredOutOfRange { min, max, result });
            }
            Ok(DiceState::Stored(DiceResult { min, max, result }))
        }
        _ => Err(EvalError::StoredMalformed),
    }
}

/// Reads a stored result, or rolls a fresh one.
pub(crate) fn resolve(element: &Element, roller: &mut Roller<'_>) -> Result<DiceResult, EvalError> {
    match classify(element)? {
        DiceState::Stored(result) => Ok(result),
        DiceState::Fresh { min, max } => Ok(DiceResult {
            min,
            max,
            result: roller.roll(min, max)?,
        }),
    }
}

fn bounds(attributes: &[Node]) -> Result<(i64, i64), EvalError> {
    let [min, max] = attributes else {
        return Err(EvalError::DiceArity {
            found: attributes.len(),
        });
    };
    let min = integer(min)?;
    let max = integer(max)?;
    if min > max {
        return Err(EvalError::DiceInverted { min, max });
    }
    Ok((min, max))
}

fn integer(node: &Node) -> Result<i64, EvalError> {
    match node {
        Node::Text { value } => value
            .parse()
            .map_err(|_| EvalError::DiceBound(value.clone())),
        other => Err(EvalError::DiceBound(crate::stringify::stringify_node(other))),
    }
}
