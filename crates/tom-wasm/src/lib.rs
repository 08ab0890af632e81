use serde::{Deserialize, Serialize};
use tom_core::{PrerenderedRoot, RandomSource, Root, SeededRandom};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RandomOptions {
    seed: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParseOutput {
    root: Root,
    diagnostics: Vec<JsDiagnostic>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreprocessOutput {
    text: String,
    diagnostics: Vec<JsDiagnostic>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrerenderOutput {
    root: PrerenderedRoot,
    diagnostics: Vec<JsDiagnostic>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsDiagnostic {
    code: String,
    message: String,
    severity: String,
    snippet: String,
    range: Option<JsRange>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsRange {
    start_line: usize,
    start_col: usize,
    end_line: usize,
    end_col: usize,
}

/// Parse tree of `source`, for editors that want to inspect markup.
#[wasm_bindgen]
pub fn parse(source: &str) -> Result<JsValue, JsValue> {
    let parsed = tom_core::parse_with_diagnostics(source);
    to_js(&ParseOutput {
        root: parsed.root,
        diagnostics: convert_diagnostics(parsed.diagnostics),
    })
}

/// Text to store for a new post. `random` is a `(min, max) => number`
/// function, a `{ seed }` object, or undefined for `Math.random`.
#[wasm_bindgen]
pub fn preprocess(source: &str, random: JsValue) -> Result<JsValue, JsValue> {
    let mut random = HostRandom::from_js(random)?.unwrap_or(HostRandom::Math);
    let mut diagnostics = tom_core::parse_with_diagnostics(source).diagnostics;
    let result =
        tom_core::preprocess_with_diagnostics(&tom_core::preparse(source), &mut random);
    random.into_result()?;
    diagnostics.extend(result.diagnostics);
    to_js(&PreprocessOutput {
        text: tom_core::stringify(&result.root),
        diagnostics: convert_diagnostics(diagnostics),
    })
}

/// Prerendered tree for stored content. Without `random`, dice that were
/// never baked fall back to their source text.
#[wasm_bindgen]
pub fn prerender(source: &str, random: JsValue) -> Result<JsValue, JsValue> {
    let mut random = HostRandom::from_js(random)?;
    let parsed = tom_core::parse_with_diagnostics(source);
    let result = tom_core::prerender_with_diagnostics(
        &parsed.root,
        random
            .as_mut()
            .map(|random| random as &mut dyn RandomSource),
    );
    if let Some(random) = random {
        random.into_result()?;
    }
    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(result.diagnostics);
    to_js(&PrerenderOutput {
        root: result.root,
        diagnostics: convert_diagnostics(diagnostics),
    })
}

#[wasm_bindgen(js_name = toOriginalFormat)]
pub fn to_original_format(db_content: &str) -> String {
    tom_core::to_original_format(db_content)
}

enum HostRandom {
    Function {
        function: js_sys::Function,
        error: Option<JsValue>,
    },
    Seeded(SeededRandom),
    Math,
}

impl HostRandom {
    fn from_js(value: JsValue) -> Result<Option<Self>, JsValue> {
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        if value.is_function() {
            return Ok(Some(HostRandom::Function {
                function: value.unchecked_into(),
                error: None,
            }));
        }
        let options: RandomOptions =
            serde_wasm_bindgen::from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))?;
        Ok(Some(match options.seed {
            Some(seed) => HostRandom::Seeded(SeededRandom::new(seed)),
            None => HostRandom::Math,
        }))
    }

    /// Rethrows the first exception raised by a JS random function.
    fn into_result(self) -> Result<(), JsValue> {
        match self {
            HostRandom::Function {
                error: Some(error), ..
            } => Err(error),
            _ => Ok(()),
        }
    }
}

impl RandomSource for HostRandom {
    fn roll(&mut self, min: i64, max: i64) -> i64 {
        match self {
            HostRandom::Function { function, error } => {
                if error.is_some() {
                    return min;
                }
                let called = function.call2(
                    &JsValue::NULL,
                    &JsValue::from_f64(min as f64),
                    &JsValue::from_f64(max as f64),
                );
                match called.map(|value| value.as_f64()) {
                    Ok(Some(value)) if value.is_finite() => value.trunc() as i64,
                    Ok(_) => {
                        *error = Some(JsValue::from_str("random source must return a number"));
                        min
                    }
                    Err(thrown) => {
                        *error = Some(thrown);
                        min
                    }
                }
            }
            HostRandom::Seeded(random) => random.roll(min, max),
            HostRandom::Math => {
                let faces = (max as f64) - (min as f64) + 1.0;
                min.saturating_add((js_sys::Math::random() * faces).floor() as i64)
            }
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn convert_diagnostics(diagnostics: Vec<tom_core::Diagnostic>) -> Vec<JsDiagnostic> {
    diagnostics
        .into_iter()
        .map(|diag| JsDiagnostic {
            code: diag.code.to_string(),
            message: diag.message,
            severity: match diag.severity {
                tom_core::DiagnosticSeverity::Error => "error".to_string(),
                tom_core::DiagnosticSeverity::Warning => "warning".to_string(),
            },
            snippet: diag.snippet,
            range: diag.range.map(|range| JsRange {
                start_line: range.start.line,
                start_col: range.start.character,
                end_line: range.end.line,
                end_col: range.end.character,
            }),
        })
        .collect()
}
