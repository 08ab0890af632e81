//! Read path: turns a parsed tree into the node set the renderer consumes.
//!
//! `dice`, `calc` and `calcn` become `DiceResult`/`CalcResult`; every other
//! element keeps its shape with prerendered attributes and children. A node
//! that cannot be evaluated is replaced by a `Text` holding its own source.

use crate::ast::{Element, Node, PrerenderedElement, PrerenderedNode, PrerenderedRoot, Root};
use crate::diagnostic::{
    Diagnostic, DiagnosticSeverity, E_CALC_INVALID, E_CALCN_INVALID, E_DICE_INVALID,
    E_DICE_NO_RANDOM,
};
use crate::dice::{self, Roller};
use crate::error::EvalError;
use crate::grammar::{CALC, CALCN, DICE};
use crate::random::RandomSource;
use crate::stringify::stringify_node;
use crate::{calc, infix};

pub struct PrerenderResult {
    pub root: PrerenderedRoot,
    pub diagnostics: Vec<Diagnostic>,
}

/// Persisted dice are read from their stored result; `random` is only
/// consulted for dice that were never rolled.
pub fn prerender(root: &Root, random: Option<&mut dyn RandomSource>) -> PrerenderedRoot {
    prerender_with_diagnostics(root, random).root
}

pub fn prerender_with_diagnostics(
    root: &Root,
    random: Option<&mut dyn RandomSource>,
) -> PrerenderResult {
    let mut prerenderer = Prerenderer {
        roller: Roller::new(random),
        diagnostics: Vec::new(),
    };
    let children = prerenderer.nodes(&root.children);
    PrerenderResult {
        root: PrerenderedRoot { children },
        diagnostics: prerenderer.diagnostics,
    }
}

struct Prerenderer<'r> {
    roller: Roller<'r>,
    diagnostics: Vec<Diagnostic>,
}

impl Prerenderer<'_> {
    fn nodes(&mut self, nodes: &[Node]) -> Vec<PrerenderedNode> {
        nodes.iter().map(|node| self.node(node)).collect()
    }

    fn node(&mut self, node: &Node) -> PrerenderedNode {
        match node {
            Node::Text { value } => PrerenderedNode::text(value.as_str()),
            Node::Nested { children } => PrerenderedNode::Nested {
                children: self.nodes(children),
            },
            Node::Element(element) => self.element(node, element),
        }
    }

    fn element(&mut self, node: &Node, element: &Element) -> PrerenderedNode {
        let (evaluated, code) = match element.name.as_str() {
            DICE => (
                dice::resolve(element, &mut self.roller).map(PrerenderedNode::DiceResult),
                E_DICE_INVALID,
            ),
            CALC => (
                calc::evaluate(element, &mut self.roller).map(PrerenderedNode::CalcResult),
                E_CALC_INVALID,
            ),
            CALCN => (
                infix::evaluate(element, &mut self.roller).map(PrerenderedNode::CalcResult),
                E_CALCN_INVALID,
            ),
            _ => {
                return PrerenderedNode::Element(PrerenderedElement {
                    name: element.name.clone(),
                    attributes: self.nodes(&element.attributes),
                    children: self.nodes(&element.children),
                });
            }
        };
        evaluated.unwrap_or_else(|error| self.fallback(node, code, error))
    }

    fn fallback(&mut self, node: &Node, code: &'static str, error: EvalError) -> PrerenderedNode {
        let code = match error {
            EvalError::NoRandomSource if code == E_DICE_INVALID => E_DICE_NO_RANDOM,
            _ => code,
        };
        let source = stringify_node(node);
        self.diagnostics.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            code,
            error.to_string(),
            source.as_str(),
        ));
        PrerenderedNode::text(source)
    }
}
