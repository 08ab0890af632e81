//! Parse trees and prerendered trees.
//!
//! Nodes carry no source offsets: the same types describe freshly parsed
//! input, trees rebuilt by preprocess, and trees assembled by hand in tests.

/// Top-level container returned by every parse entry point.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Root {
    pub children: Vec<Node>,
}

impl Root {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "camelCase"))]
pub enum Node {
    Text { value: String },
    Element(Element),
    /// Parenthesized group. Only produced in attribute position; `(` in
    /// children position is plain text.
    Nested { children: Vec<Node> },
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    pub fn nested(children: Vec<Node>) -> Self {
        Node::Nested { children }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text { value } => Some(value),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Element {
    /// Canonical lowercase tag name, aliases already resolved.
    pub name: String,
    pub attributes: Vec<Node>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<Node>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

/// Output of the read path. The renderer dispatches on the variant.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PrerenderedRoot {
    pub children: Vec<PrerenderedNode>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "camelCase"))]
pub enum PrerenderedNode {
    Text { value: String },
    Element(PrerenderedElement),
    Nested { children: Vec<PrerenderedNode> },
    DiceResult(DiceResult),
    CalcResult(CalcResult),
}

impl PrerenderedNode {
    pub fn text(value: impl Into<String>) -> Self {
        PrerenderedNode::Text {
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PrerenderedElement {
    pub name: String,
    pub attributes: Vec<PrerenderedNode>,
    pub children: Vec<PrerenderedNode>,
}

/// A concrete roll. `min <= result <= max` always holds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DiceResult {
    pub min: i64,
    pub max: i64,
    pub result: i64,
}

impl DiceResult {
    /// `[min~max]result`, the form dice take inside calc expressions.
    pub fn display(&self) -> String {
        format!("[{}~{}]{}", self.min, self.max, self.result)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CalcResult {
    pub expression: String,
    pub result: f64,
}
