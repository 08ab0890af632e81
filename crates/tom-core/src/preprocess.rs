//! Write path: bakes every fresh dice roll into the tree so the stringified
//! result can be stored and replayed without rolling again.

use crate::ast::{Element, Node, Root};
use crate::diagnostic::{Diagnostic, DiagnosticSeverity, E_DICE_INVALID};
use crate::dice::{self, DiceState, Roller};
use crate::grammar::{CALCN, DICE};
use crate::parser::parse;
use crate::random::RandomSource;
use crate::stringify::{stringify_node, stringify_nodes};

pub struct PreprocessResult {
    pub root: Root,
    pub diagnostics: Vec<Diagnostic>,
}

/// Calls `random` exactly once per fresh dice, depth-first in document order.
pub fn preprocess(root: &Root, random: &mut dyn RandomSource) -> Root {
    preprocess_with_diagnostics(root, random).root
}

pub fn preprocess_with_diagnostics(root: &Root, random: &mut dyn RandomSource) -> PreprocessResult {
    let mut preprocessor = Preprocessor {
        roller: Roller::new(Some(random)),
        diagnostics: Vec::new(),
    };
    let children = preprocessor.nodes(&root.children);
    PreprocessResult {
        root: Root::new(children),
        diagnostics: preprocessor.diagnostics,
    }
}

struct Preprocessor<'r> {
    roller: Roller<'r>,
    diagnostics: Vec<Diagnostic>,
}

impl Preprocessor<'_> {
    fn nodes(&mut self, nodes: &[Node]) -> Vec<Node> {
        nodes.iter().map(|node| self.node(node)).collect()
    }

    fn node(&mut self, node: &Node) -> Node {
        match node {
            Node::Text { .. } => node.clone(),
            Node::Nested { children } => Node::nested(self.nodes(children)),
            Node::Element(element) if element.is(DICE) => self.dice(node, element),
            Node::Element(element) if element.is(CALCN) => {
                let attributes = element
                    .attributes
                    .iter()
                    .map(|attribute| match attribute {
                        Node::Text { value } => Node::text(self.bake_raw(value)),
                        other => self.node(other),
                    })
                    .collect();
                Element::new(CALCN)
                    .with_attributes(attributes)
                    .with_children(self.nodes(&element.children))
                    .into()
            }
            Node::Element(element) => Element::new(element.name.as_str())
                .with_attributes(self.nodes(&element.attributes))
                .with_children(self.nodes(&element.children))
                .into(),
        }
    }

    fn dice(&mut self, node: &Node, element: &Element) -> Node {
        let rolled = dice::classify(element).and_then(|state| match state {
            DiceState::Stored(_) => Ok(None),
            DiceState::Fresh { min, max } => self.roller.roll(min, max).map(Some),
        });
        match rolled {
            Ok(None) => node.clone(),
            Ok(Some(result)) => Element::new(DICE)
                .with_attributes(element.attributes.clone())
                .with_children(vec![Node::text(result.to_string())])
                .into(),
            Err(error) => {
                let source = stringify_node(node);
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticSeverity::Error,
                    E_DICE_INVALID,
                    error.to_string(),
                    source.as_str(),
                ));
                Node::text(source)
            }
        }
    }

    /// Dice inside a calcn formula live in its raw attribute text.
    fn bake_raw(&mut self, raw: &str) -> String {
        let parsed = parse(raw);
        if !parsed.children.iter().any(|node| node.as_element().is_some()) {
            return raw.to_string();
        }
        stringify_nodes(&self.nodes(&parsed.children))
    }
}
