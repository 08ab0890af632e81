use crate::ast::{Element, Node, Root};
use crate::grammar::{CALC, CALCN, DICE};
use crate::parser::parse;
use crate::stringify::stringify;

/// Turns stored content back into what its author typed: every baked
/// `[dice a b]n[/dice]` becomes `[dice a b]`. Parsing never fails, and text
/// without a baked dice comes back byte-for-byte.
pub fn to_original_format(db_content: &str) -> String {
    let root = parse(db_content);
    let mut stripped = false;
    let children = strip_nodes(&root.children, &mut stripped);
    if !stripped {
        return db_content.to_string();
    }
    stringify(&Root::new(children))
}

fn strip_nodes(nodes: &[Node], stripped: &mut bool) -> Vec<Node> {
    nodes.iter().map(|node| strip_node(node, stripped)).collect()
}

fn strip_node(node: &Node, stripped: &mut bool) -> Node {
    match node {
        Node::Text { .. } => node.clone(),
        Node::Nested { children } => Node::nested(strip_nodes(children, stripped)),
        Node::Element(element) if element.is(DICE) && !element.children.is_empty() => {
            *stripped = true;
            Element::new(DICE)
                .with_attributes(element.attributes.clone())
                .into()
        }
        // Stored formulas are already in their editable form.
        Node::Element(element) if element.is(CALC) || element.is(CALCN) => node.clone(),
        Node::Element(element) => Element::new(element.name.as_str())
            .with_attributes(strip_nodes(&element.attributes, stripped))
            .with_children(strip_nodes(&element.children, stripped))
            .into(),
    }
}
