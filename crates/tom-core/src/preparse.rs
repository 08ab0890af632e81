use crate::ast::{Element, Node, Root};
use crate::grammar::{CALCN, DICE};
use crate::parser::parse;
use crate::stringify::stringify_nodes;

/// Parses text as typed by a user and applies the submission-time rewrites:
/// `[dice N]` becomes `[dice 1 N]`, and a typed-in dice result is dropped so
/// only the write path can bake one.
pub fn preparse(source: &str) -> Root {
    Root::new(rewrite_nodes(&parse(source).children))
}

fn rewrite_nodes(nodes: &[Node]) -> Vec<Node> {
    nodes.iter().map(rewrite_node).collect()
}

fn rewrite_node(node: &Node) -> Node {
    match node {
        Node::Text { .. } => node.clone(),
        Node::Nested { children } => Node::nested(rewrite_nodes(children)),
        Node::Element(element) if element.is(DICE) => Element::new(DICE)
            .with_attributes(expand_shorthand(&element.attributes))
            .into(),
        Node::Element(element) => {
            let attributes = if element.is(CALCN) {
                element
                    .attributes
                    .iter()
                    .map(|attribute| match attribute {
                        Node::Text { value } => Node::text(rewrite_raw(value)),
                        other => rewrite_node(other),
                    })
                    .collect()
            } else {
                rewrite_nodes(&element.attributes)
            };
            Element::new(element.name.as_str())
                .with_attributes(attributes)
                .with_children(rewrite_nodes(&element.children))
                .into()
        }
    }
}

fn expand_shorthand(attributes: &[Node]) -> Vec<Node> {
    if let [Node::Text { value }] = attributes
        && let Ok(sides) = value.parse::<i64>()
        && sides >= 1
    {
        return vec![Node::text("1"), Node::text(sides.to_string())];
    }
    attributes.to_vec()
}

fn rewrite_raw(raw: &str) -> String {
    let parsed = parse(raw);
    if !parsed.children.iter().any(|node| node.as_element().is_some()) {
        return raw.to_string();
    }
    stringify_nodes(&rewrite_nodes(&parsed.children))
}
