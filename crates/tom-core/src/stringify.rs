use crate::ast::{Element, Node, Root};
use crate::grammar::is_self_closing;

/// Serializes a tree back to TOM text. For canonical input
/// `stringify(&parse(s)) == s`.
pub fn stringify(root: &Root) -> String {
    stringify_nodes(&root.children)
}

pub fn stringify_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

/// Source form of a single node; also what every evaluation fallback shows.
pub fn stringify_node(node: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Text { value } => out.push_str(value),
        Node::Element(element) => write_element(out, element),
        Node::Nested { children } => {
            out.push('(');
            write_joined(out, children);
            out.push(')');
        }
    }
}

fn write_element(out: &mut String, element: &Element) {
    out.push('[');
    out.push_str(&element.name);
    if !element.attributes.is_empty() {
        out.push(' ');
        write_joined(out, &element.attributes);
    }
    out.push(']');
    // A resolved dice keeps its closer even though the tag self-closes.
    if element.children.is_empty() && is_self_closing(&element.name) {
        return;
    }
    for child in &element.children {
        write_node(out, child);
    }
    out.push_str("[/");
    out.push_str(&element.name);
    out.push(']');
}

fn write_joined(out: &mut String, nodes: &[Node]) {
    for (idx, node) in nodes.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        write_node(out, node);
    }
}
