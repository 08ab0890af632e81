mod ast;
mod calc;
mod diagnostic;
mod dice;
mod error;
mod grammar;
mod infix;
mod parser;
mod preparse;
mod preprocess;
mod prerender;
mod random;
mod source_map;
mod span;
mod stringify;
mod utils;

pub use ast::{
    CalcResult, DiceResult, Element, Node, PrerenderedElement, PrerenderedNode, PrerenderedRoot,
    Root,
};
pub use diagnostic::{
    Diagnostic, DiagnosticSeverity, E_CALC_INVALID, E_CALCN_INVALID, E_DICE_INVALID,
    E_DICE_NO_RANDOM, W_BRACKET_MALFORMED, W_DEPTH_LIMIT, W_TAG_UNKNOWN, W_TAG_UNTERMINATED,
};
pub use error::EvalError;
pub use grammar::{
    CALC, CALCN, DICE, ResolvedTag, TagKind, TagSpec, is_self_closing, resolve_tag, tag_spec,
};
pub use parser::{MAX_DEPTH, ParseResult, parse, parse_with_diagnostics};
pub use preparse::preparse;
pub use preprocess::{PreprocessResult, preprocess, preprocess_with_diagnostics};
pub use prerender::{PrerenderResult, prerender, prerender_with_diagnostics};
pub use random::{RandomSource, SeededRandom};
pub use source_map::{Position, Range, SourceMap};
pub use span::Span;
pub use stringify::{stringify, stringify_node, stringify_nodes};
pub use utils::to_original_format;
