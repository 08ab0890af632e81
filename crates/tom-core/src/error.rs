use thiserror::Error;

/// Why a dice/calc/calcn node could not be evaluated. Never returned to
/// callers of the pipeline; the node falls back to its source text and the
/// error becomes a diagnostic message.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("dice takes 2 integer bounds, found {found} attribute(s)")]
    DiceArity { found: usize },
    #[error("dice bound `{0}` is not an integer")]
    DiceBound(String),
    #[error("dice bounds are inverted ({min} > {max})")]
    DiceInverted { min: i64, max: i64 },
    #[error("stored dice result is malformed")]
    StoredMalformed,
    #[error("stored dice result {result} is outside {min}..={max}")]
    StoredOutOfRange { min: i64, max: i64, result: i64 },
    #[error("dice needs a random source to roll")]
    NoRandomSource,
    #[error("calc takes one parenthesized expression")]
    CalcShape,
    #[error("calcn takes one infix expression")]
    CalcnShape,
    #[error("unsupported operator `{0}`")]
    UnknownOperator(String),
    #[error("operator `{0}` has no operands")]
    MissingOperand(char),
    #[error("`{0}` is not a number")]
    NotANumber(String),
    #[error("`{0}` is not allowed inside an expression")]
    UnsupportedTag(String),
    #[error("unexpected `{0}` in expression")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expression nests too deeply")]
    TooDeep,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
}
