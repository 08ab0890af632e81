use std::collections::HashSet;

use crate::ast::{Element, Node, Root};
use crate::diagnostic::{
    Diagnostic, DiagnosticSeverity, W_BRACKET_MALFORMED, W_DEPTH_LIMIT, W_TAG_UNKNOWN,
    W_TAG_UNTERMINATED,
};
use crate::grammar::resolve_tag;
use crate::source_map::SourceMap;
use crate::span::Span;

/// Deepest tag/group nesting the parser descends into. Openers below this
/// depth are kept as literal text.
pub const MAX_DEPTH: usize = 64;

pub struct ParseResult {
    pub root: Root,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parses TOM markup. Never fails: anything that does not match the grammar
/// stays in the tree as literal text.
pub fn parse(source: &str) -> Root {
    let mut parser = Parser::new(source);
    parser.parse_root()
}

pub fn parse_with_diagnostics(source: &str) -> ParseResult {
    let mut parser = Parser::new(source);
    let root = parser.parse_root();
    let source_map = SourceMap::new(source);
    let diagnostics = parser
        .issues
        .into_iter()
        .map(|issue| {
            Diagnostic::new(
                DiagnosticSeverity::Warning,
                issue.code,
                issue.message,
                issue.span.text(source),
            )
            .with_range(source_map.range(issue.span))
        })
        .collect();
    ParseResult { root, diagnostics }
}

struct Issue {
    span: Span,
    code: &'static str,
    message: String,
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    // Canonical names of the containers whose children are being scanned.
    open: Vec<&'static str>,
    // Offsets of `[` already known not to start a tag.
    failed: HashSet<usize>,
    issues: Vec<Issue>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            open: Vec::new(),
            failed: HashSet::new(),
            issues: Vec::new(),
        }
    }

    fn parse_root(&mut self) -> Root {
        let (children, _) = self.parse_children(None, 0);
        Root::new(children)
    }

    /// Scans text and tags until `closer` is consumed (returns `true`), an
    /// ancestor's closer is reached, or input ends.
    fn parse_children(&mut self, closer: Option<&'static str>, depth: usize) -> (Vec<Node>, bool) {
        let mut nodes = Vec::new();
        let mut text_start = self.pos;

        while let Some(ch) = self.peek() {
            if ch != '[' {
                self.pos += ch.len_utf8();
                continue;
            }
            let at = self.pos;
            if let Some((name, end)) = self.closing_tag_at(at) {
                if Some(name) == closer {
                    push_text(&mut nodes, &self.source[text_start..at]);
                    self.pos = end;
                    return (nodes, true);
                }
                if self.open.contains(&name) {
                    push_text(&mut nodes, &self.source[text_start..at]);
                    return (nodes, false);
                }
            }
            if let Some(node) = self.parse_tag(depth) {
                push_text(&mut nodes, &self.source[text_start..at]);
                nodes.push(node);
                text_start = self.pos;
                continue;
            }
            self.pos = at + 1;
        }

        push_text(&mut nodes, &self.source[text_start..self.pos]);
        (nodes, false)
    }

    /// Tries to parse a tag at the current `[`. On `None` the position is
    /// unspecified and the caller restores it.
    fn parse_tag(&mut self, depth: usize) -> Option<Node> {
        let start = self.pos;
        if self.failed.contains(&start) {
            return None;
        }
        let name_start = start + 1;
        let name_len = self.source[name_start..]
            .bytes()
            .take_while(u8::is_ascii_alphabetic)
            .count();
        if name_len == 0 {
            return None;
        }
        let name = &self.source[name_start..name_start + name_len];
        let after_name = name_start + name_len;
        match self.source[after_name..].chars().next() {
            Some(']') => {}
            Some(ch) if ch.is_whitespace() => {}
            _ => return None,
        }
        if depth >= MAX_DEPTH {
            self.issue(
                Span::new(start, after_name),
                W_DEPTH_LIMIT,
                format!("`[{name}` is nested deeper than {MAX_DEPTH} levels"),
            );
            return None;
        }

        let Some(tag) = resolve_tag(name) else {
            return self.parse_unknown_tag(start, name, depth);
        };

        let issues_len = self.issues.len();
        self.pos = after_name;
        let parsed = if tag.spec.raw_attribute {
            self.parse_raw_attribute()
        } else {
            self.parse_attributes(depth)
        };
        let Some(parsed) = parsed else {
            self.issues.truncate(issues_len);
            self.failed.insert(start);
            self.issue(
                Span::new(start, after_name),
                W_BRACKET_MALFORMED,
                format!("`[{name}` is not closed by `]`"),
            );
            return None;
        };

        let mut attributes: Vec<Node> = tag
            .implied_attributes
            .iter()
            .map(|value| Node::text(*value))
            .collect();
        attributes.extend(parsed);
        let mut element = Element::new(tag.spec.name).with_attributes(attributes);
        let open_end = self.pos;

        if tag.spec.is_self_closing() {
            if tag.spec.stores_result
                && let Some((value, end)) = self.stored_result_at(open_end, tag.spec.name)
            {
                element.children.push(Node::text(value));
                self.pos = end;
            }
            return Some(Node::Element(element));
        }

        self.open.push(tag.spec.name);
        let (children, closed) = self.parse_children(Some(tag.spec.name), depth + 1);
        self.open.pop();
        if !closed {
            self.issue(
                Span::new(start, open_end),
                W_TAG_UNTERMINATED,
                format!("`[{name}]` has no matching `[/{name}]`"),
            );
        }
        element.children = children;
        Some(Node::Element(element))
    }

    /// An unrecognized name keeps its whole span, through a matching closer
    /// when there is one, as literal text.
    fn parse_unknown_tag(&mut self, start: usize, name: &str, depth: usize) -> Option<Node> {
        let issues_len = self.issues.len();
        self.pos = start + 1 + name.len();
        let attributes = self.parse_attributes(depth);
        self.issues.truncate(issues_len);
        if attributes.is_none() {
            self.failed.insert(start);
            return None;
        }
        let open_end = self.pos;
        let end = self.find_closer(open_end, name).unwrap_or(open_end);
        self.pos = end;
        self.issue(
            Span::new(start, open_end),
            W_TAG_UNKNOWN,
            format!("unknown tag `{name}`"),
        );
        Some(Node::text(&self.source[start..end]))
    }

    fn parse_attributes(&mut self, depth: usize) -> Option<Vec<Node>> {
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek()? {
                ']' => {
                    self.pos += 1;
                    return Some(attributes);
                }
                _ => attributes.push(self.parse_attribute_token(depth, false)?),
            }
        }
    }

    /// `None` at a recognized `[/name]`: a closer always ends the opener
    /// attempt, so the enclosing container still sees it.
    fn parse_attribute_token(&mut self, depth: usize, in_group: bool) -> Option<Node> {
        if self.closing_tag_at(self.pos).is_some() {
            return None;
        }
        match self.peek()? {
            '(' if depth + 1 < MAX_DEPTH => return self.parse_group(depth + 1),
            '(' => {
                self.issue(
                    Span::new(self.pos, self.pos + 1),
                    W_DEPTH_LIMIT,
                    format!("group is nested deeper than {MAX_DEPTH} levels"),
                );
            }
            '[' => {
                let at = self.pos;
                if let Some(node) = self.parse_tag(depth + 1) {
                    return Some(node);
                }
                self.pos = at;
            }
            _ => {}
        }
        Some(self.scan_word(in_group))
    }

    /// `(` ... `)` in attribute position. `None` when the group is not closed
    /// before the tag's `]`, a closing tag or end of input.
    fn parse_group(&mut self, depth: usize) -> Option<Node> {
        self.pos += 1;
        let mut children = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek()? {
                ')' => {
                    self.pos += 1;
                    return Some(Node::nested(children));
                }
                ']' => return None,
                _ => children.push(self.parse_attribute_token(depth, true)?),
            }
        }
    }

    /// Consumes one attribute word. The first character is always taken.
    fn scan_word(&mut self, in_group: bool) -> Node {
        let start = self.pos;
        if let Some(first) = self.peek() {
            self.pos += first.len_utf8();
        }
        while let Some(ch) = self.peek() {
            let stop = ch.is_whitespace()
                || ch == ']'
                || ch == '['
                || (in_group && (ch == '(' || ch == ')'));
            if stop {
                break;
            }
            self.pos += ch.len_utf8();
        }
        Node::text(&self.source[start..self.pos])
    }

    /// Everything up to the `]` balancing the tag's own `[`, verbatim.
    fn parse_raw_attribute(&mut self) -> Option<Vec<Node>> {
        let first = self.peek()?;
        self.pos += first.len_utf8();
        if first == ']' {
            return Some(Vec::new());
        }
        let raw_start = self.pos;
        let mut depth = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                '[' => depth += 1,
                ']' if depth == 0 => {
                    let raw = &self.source[raw_start..self.pos];
                    self.pos += 1;
                    if raw.is_empty() {
                        return Some(Vec::new());
                    }
                    return Some(vec![Node::text(raw)]);
                }
                ']' => depth -= 1,
                _ => {}
            }
            self.pos += ch.len_utf8();
        }
        None
    }

    /// `-?[0-9]+` immediately followed by `[/name]`.
    fn stored_result_at(&self, at: usize, name: &str) -> Option<(&'a str, usize)> {
        let rest = &self.source[at..];
        let sign = usize::from(rest.starts_with('-'));
        let digits = rest[sign..].bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        let value_end = at + sign + digits;
        let (closer, end) = self.closing_tag_at(value_end)?;
        (closer == name).then(|| (&self.source[at..value_end], end))
    }

    /// Canonical name and end offset of a `[/name]` closer starting at `at`.
    fn closing_tag_at(&self, at: usize) -> Option<(&'static str, usize)> {
        let inner = self.source.get(at..)?.strip_prefix("[/")?;
        let name_len = inner.bytes().take_while(u8::is_ascii_alphabetic).count();
        if name_len == 0 || !inner[name_len..].starts_with(']') {
            return None;
        }
        let tag = resolve_tag(&inner[..name_len])?;
        Some((tag.spec.name, at + 2 + name_len + 1))
    }

    fn find_closer(&self, from: usize, name: &str) -> Option<usize> {
        self.source[from..]
            .match_indices("[/")
            .map(|(offset, _)| from + offset + 2)
            .find_map(|name_start| {
                let candidate = self.source.get(name_start..name_start + name.len())?;
                let end = name_start + name.len();
                (candidate.eq_ignore_ascii_case(name) && self.source[end..].starts_with(']'))
                    .then_some(end + 1)
            })
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn issue(&mut self, span: Span, code: &'static str, message: String) {
        self.issues.push(Issue {
            span,
            code,
            message,
        });
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if !text.is_empty() {
        nodes.push(Node::text(text));
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_DEPTH, parse, parse_with_diagnostics};
    use crate::ast::{Element, Node};
    use crate::diagnostic::{W_BRACKET_MALFORMED, W_TAG_UNKNOWN, W_TAG_UNTERMINATED};
    use crate::stringify::stringify;

    fn element(node: &Node) -> &Element {
        node.as_element().expect("element")
    }

    #[test]
    fn plain_text_is_a_single_node() {
        let root = parse("그냥 텍스트 (괄호 포함)");
        assert_eq!(root.children, vec![Node::text("그냥 텍스트 (괄호 포함)")]);
    }

    #[test]
    fn alias_adds_implied_attribute_and_closes_by_alias() {
        let root = parse("[clrred]경고[/clrred]");
        let clr = element(&root.children[0]);
        assert_eq!(clr.name, "clr");
        assert_eq!(clr.attributes, vec![Node::text("red")]);
        assert_eq!(clr.children, vec![Node::text("경고")]);
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        let root = parse("[BLD]x[/bld]");
        assert_eq!(element(&root.children[0]).name, "bld");
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn self_closing_tags_do_not_take_children() {
        let root = parse("[hr]after");
        assert_eq!(element(&root.children[0]).children, Vec::<Node>::new());
        assert_eq!(root.children[1], Node::text("after"));
    }

    #[test]
    fn stored_dice_needs_digits_directly_before_closer() {
        let root = parse("[dice 1 6] 3[/dice]");
        let dice = element(&root.children[0]);
        assert!(dice.children.is_empty());
        assert_eq!(root.children[1], Node::text(" 3[/dice]"));

        let root = parse("[dice -3 3]-2[/dice]");
        assert_eq!(element(&root.children[0]).children, vec![Node::text("-2")]);
    }

    #[test]
    fn groups_nest_and_hold_embedded_tags() {
        let root = parse("[calc (* (+ 1 2) [dice 1 6])][/calc]");
        let calc = element(&root.children[0]);
        let Node::Nested { children } = &calc.attributes[0] else {
            panic!("expected nested attribute");
        };
        assert_eq!(children[0], Node::text("*"));
        assert!(matches!(children[1], Node::Nested { .. }));
        assert_eq!(element(&children[2]).name, "dice");
    }

    #[test]
    fn raw_attribute_keeps_brackets_and_spaces() {
        let root = parse("[calcn 2 * [dice 1 6]4[/dice] + 1][/calcn]");
        let calcn = element(&root.children[0]);
        assert_eq!(
            calcn.attributes,
            vec![Node::text("2 * [dice 1 6]4[/dice] + 1")]
        );
    }

    #[test]
    fn unknown_tag_swallows_through_its_closer() {
        let parsed = parse_with_diagnostics("a[foo x][bld]b[/bld][/foo]c");
        assert_eq!(
            parsed.root.children,
            vec![
                Node::text("a"),
                Node::text("[foo x][bld]b[/bld][/foo]"),
                Node::text("c"),
            ]
        );
        assert_eq!(parsed.diagnostics[0].code, W_TAG_UNKNOWN);
    }

    #[test]
    fn unclosed_bracket_is_literal() {
        let parsed = parse_with_diagnostics("[bld 굵게");
        assert_eq!(parsed.root.children, vec![Node::text("[bld 굵게")]);
        assert_eq!(parsed.diagnostics[0].code, W_BRACKET_MALFORMED);
    }

    #[test]
    fn unterminated_container_keeps_children() {
        let parsed = parse_with_diagnostics("[quote]인용");
        let quote = element(&parsed.root.children[0]);
        assert_eq!(quote.children, vec![Node::text("인용")]);
        assert_eq!(parsed.diagnostics[0].code, W_TAG_UNTERMINATED);
        assert_eq!(parsed.diagnostics[0].range.map(|r| r.end.character), Some(7));
    }

    #[test]
    fn closer_is_not_an_attribute() {
        let parsed = parse_with_diagnostics("[b]hello [dice 1 [/b]");
        assert_eq!(parsed.root.children.len(), 1);
        let bld = element(&parsed.root.children[0]);
        assert_eq!(bld.children, vec![Node::text("hello [dice 1 ")]);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].code, W_BRACKET_MALFORMED);

        let root = parse("[b][calc (+ 1 [/b])]");
        let bld = element(&root.children[0]);
        assert_eq!(bld.children, vec![Node::text("[calc (+ 1 ")]);
        assert_eq!(root.children[1], Node::text(")]"));
    }

    #[test]
    fn unknown_closer_stays_a_word() {
        let root = parse("[clr [/x]]y[/clr]");
        let clr = element(&root.children[0]);
        assert_eq!(clr.attributes, vec![Node::text("[/x")]);
        assert_eq!(clr.children, vec![Node::text("]y")]);
    }

    #[test]
    fn written_closers_read_back_unchanged() {
        let cases = [
            "[b]hello [dice 1",
            "[clrred][[calcx 1[clrred]",
            "[bld][calc (+ 1",
            "[i][b][foo x",
        ];
        for source in cases {
            let once = stringify(&parse(source));
            assert_eq!(stringify(&parse(&once)), once, "reparse of {once:?}");
        }
        assert_eq!(stringify(&parse(cases[0])), "[bld]hello [dice 1[/bld]");
    }

    #[test]
    fn ancestor_closer_ends_inner_container() {
        let root = parse("[bld][itl]x[/bld]y");
        let bld = element(&root.children[0]);
        let itl = element(&bld.children[0]);
        assert_eq!(itl.children, vec![Node::text("x")]);
        assert_eq!(root.children[1], Node::text("y"));
    }

    #[test]
    fn stray_closer_is_text() {
        let root = parse("[/bld]x");
        assert_eq!(root.children, vec![Node::text("[/bld]x")]);
    }

    #[test]
    fn depth_limit_degrades_to_text() {
        let source = format!("{}x", "[bld]".repeat(MAX_DEPTH + 5));
        let parsed = parse_with_diagnostics(&source);

        let mut depth = 0;
        let mut node = &parsed.root.children[0];
        while let Node::Element(element) = node {
            depth += 1;
            node = &element.children[0];
        }
        assert_eq!(depth, MAX_DEPTH);
        assert_eq!(node, &Node::text("[bld][bld][bld][bld][bld]x"));
    }

    #[test]
    fn unmatched_openers_stay_linear() {
        let source = "[b ".repeat(2000);
        let root = parse(&source);
        assert_eq!(root.children, vec![Node::text(source.as_str())]);
    }
}
