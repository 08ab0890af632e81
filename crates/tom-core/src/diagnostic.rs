use crate::source_map::Range;

pub const W_TAG_UNKNOWN: &str = "W_TAG_UNKNOWN";
pub const W_TAG_UNTERMINATED: &str = "W_TAG_UNTERMINATED";
pub const W_BRACKET_MALFORMED: &str = "W_BRACKET_MALFORMED";
pub const W_DEPTH_LIMIT: &str = "W_DEPTH_LIMIT";

pub const E_DICE_INVALID: &str = "E_DICE_INVALID";
pub const E_DICE_NO_RANDOM: &str = "E_DICE_NO_RANDOM";
pub const E_CALC_INVALID: &str = "E_CALC_INVALID";
pub const E_CALCN_INVALID: &str = "E_CALCN_INVALID";

/// Something the pipeline recovered from. Never fatal: the offending span is
/// kept as literal text in the output tree.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    /// Only parse diagnostics carry a range; evaluation runs over trees that
    /// no longer know their source offsets.
    pub range: Option<Range>,
    pub severity: DiagnosticSeverity,
    pub code: &'static str,
    pub message: String,
    /// Source text of the node that was degraded.
    pub snippet: String,
}

impl Diagnostic {
    pub fn new(
        severity: DiagnosticSeverity,
        code: &'static str,
        message: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            range: None,
            severity,
            code,
            message: message.into(),
            snippet: snippet.into(),
        }
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}
