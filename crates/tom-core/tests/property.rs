use std::panic;

use proptest::prelude::*;
use tom_core::{
    Element, Node, PrerenderedNode, Root, SeededRandom, parse, preparse, preprocess, prerender,
    stringify, to_original_format,
};

const CASES: usize = 200;
const MAX_LEN: usize = 256;
const CHARSET: &[char] = &[
    'a', 'b', '1', '6', '-', '+', '*', '/', '%', ' ', '\n', '(', ')', '[', ']', '/', '가', '한',
    'd', 'i', 'c', 'e', 'l', 'r', 'n', 'b', 'd',
];
const SNIPPETS: &[&str] = &[
    "[dice", "[/dice]", "[calc", "[/calc]", "[calcn", "[/calcn]", "[bld]", "[/bld]", "[clrred]",
    "[/clrred]", "[hr]", "[foo]", "[/foo]", "(+ ", "[dice 1 6]", "3[/dice]",
];

fn word() -> impl Strategy<Value = String> {
    "[a-z0-9#.]{1,6}"
}

fn text() -> impl Strategy<Value = Node> {
    "[a-z가-힣 ]{1,8}".prop_map(Node::text)
}

fn dice() -> impl Strategy<Value = Node> {
    (-50i64..50, 0i64..50, any::<bool>()).prop_map(|(min, width, stored)| {
        let max = min + width;
        let element = Element::new("dice")
            .with_attributes(vec![Node::text(min.to_string()), Node::text(max.to_string())]);
        if stored {
            Node::from(element.with_children(vec![Node::text(max.to_string())]))
        } else {
            Node::from(element)
        }
    })
}

fn calc() -> impl Strategy<Value = Node> {
    (
        prop_oneof![Just("+"), Just("-"), Just("*"), Just("/")],
        prop::collection::vec(word(), 1..4),
    )
        .prop_map(|(op, operands)| {
            let mut group = vec![Node::text(op)];
            group.extend(operands.into_iter().map(Node::text));
            Node::from(Element::new("calc").with_attributes(vec![Node::nested(group)]))
        })
}

fn node() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        4 => text(),
        1 => Just(Node::from(Element::new("hr"))),
        2 => dice(),
        1 => calc(),
        1 => "[0-9+*/ ]{1,8}".prop_map(|raw| Node::from(
            Element::new("calcn").with_attributes(vec![Node::text(format!("1{raw}"))])
        )),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            prop_oneof![Just("bld"), Just("itl"), Just("clr"), Just("quote"), Just("spoiler")],
            prop::collection::vec(word(), 0..2),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(name, attributes, children)| {
                Node::from(
                    Element::new(name)
                        .with_attributes(attributes.into_iter().map(Node::text).collect())
                        .with_children(children),
                )
            })
    })
}

fn canonical() -> impl Strategy<Value = String> {
    prop::collection::vec(node(), 0..6).prop_map(|children| stringify(&Root::new(children)))
}

/// Fragments of tags glued together with stray characters, like a post
/// typed in a hurry.
fn messy() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        1 => prop::sample::select(SNIPPETS).prop_map(str::to_string),
        3 => prop::sample::select(CHARSET).prop_map(String::from),
    ];
    prop::collection::vec(piece, 0..64).prop_map(|pieces| pieces.concat())
}

fn collect_dice(nodes: &[PrerenderedNode], out: &mut Vec<(i64, i64, i64)>) {
    for node in nodes {
        match node {
            PrerenderedNode::DiceResult(dice) => out.push((dice.min, dice.max, dice.result)),
            PrerenderedNode::Element(element) => {
                collect_dice(&element.attributes, out);
                collect_dice(&element.children, out);
            }
            PrerenderedNode::Nested { children } => collect_dice(children, out),
            PrerenderedNode::Text { .. } | PrerenderedNode::CalcResult(_) => {}
        }
    }
}

proptest! {
    #[test]
    fn canonical_text_round_trips(source in canonical()) {
        prop_assert_eq!(stringify(&parse(&source)), source);
    }

    #[test]
    fn rolls_stay_within_bounds(min in -1_000i64..1_000, width in 0i64..1_000, seed in any::<u64>()) {
        let max = min + width;
        let mut random = SeededRandom::new(seed);
        let source = format!("[dice {min} {max}] [bld][dice {min} {max}][/bld]");
        let root = prerender(&parse(&source), Some(&mut random));
        let mut dice = Vec::new();
        collect_dice(&root.children, &mut dice);
        prop_assert_eq!(dice.len(), 2);
        for (_, _, result) in dice {
            prop_assert!(min <= result && result <= max);
        }
    }

    #[test]
    fn out_of_range_sources_are_clamped(min in -100i64..100, width in 0i64..100, raw in any::<i64>()) {
        let max = min + width;
        let mut broken = move |_min: i64, _max: i64| raw;
        let root = prerender(&parse(&format!("[dice {min} {max}]")), Some(&mut broken));
        let PrerenderedNode::DiceResult(dice) = &root.children[0] else {
            return Err(TestCaseError::fail("expected a dice result"));
        };
        prop_assert!(min <= dice.result && dice.result <= max);
    }

    #[test]
    fn baked_content_reads_back_unchanged(source in canonical(), seed in any::<u64>()) {
        let mut random = SeededRandom::new(seed);
        let stored = stringify(&preprocess(&preparse(&source), &mut random));
        let first = prerender(&parse(&stored), None);
        let second = prerender(&parse(&stored), None);
        prop_assert_eq!(first, second);
        prop_assert_eq!(stringify(&parse(&stored)), stored.clone());
    }

    #[test]
    fn messy_text_is_stable(source in messy(), seed in any::<u64>()) {
        let once = stringify(&parse(&source));
        prop_assert_eq!(stringify(&parse(&once)), once.clone());

        let mut random = SeededRandom::new(seed);
        let stored = stringify(&preprocess(&preparse(&source), &mut random));
        prop_assert_eq!(stringify(&parse(&stored)), stored.clone());
    }
}

#[test]
fn pipeline_never_panics_on_random_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x5eed_d1ce_2d6a_9b31);
    for case in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_source(&mut rng, len);
        let result = panic::catch_unwind(|| {
            let mut random = SeededRandom::new(case as u64);
            let stored = stringify(&preprocess(&preparse(&source), &mut random));
            let _ = prerender(&parse(&stored), None);
            let _ = prerender(&parse(&source), Some(&mut random));
            to_original_format(&stored)
        });
        if result.is_err() {
            return Err(format!("pipeline panicked for case {}: {:?}", case, source).into());
        }
    }
    Ok(())
}

#[test]
fn malformed_input_reads_back_unchanged() {
    let mut rng = Lcg::new(0x0dd5_b7ac_c3e1_7f05);
    for case in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_source(&mut rng, len);

        let once = stringify(&parse(&source));
        assert_eq!(stringify(&parse(&once)), once, "case {case}: {source:?}");

        let mut random = SeededRandom::new(case as u64);
        let stored = stringify(&preprocess(&preparse(&source), &mut random));
        assert_eq!(stringify(&parse(&stored)), stored, "case {case}: {source:?}");
    }
}

#[test]
fn deep_nesting_does_not_overflow() {
    let depth = 10_000;
    let source = format!("{}x{}", "[bld]".repeat(depth), "[/bld]".repeat(depth));
    let root = parse(&source);
    assert!(!root.children.is_empty());

    let group = format!("[calc {}1{}][/calc]", "(+ ".repeat(depth), ")".repeat(depth));
    let _ = prerender(&parse(&group), None);

    let infix = format!("[calcn {}1{}][/calcn]", "(".repeat(depth), ")".repeat(depth));
    let _ = prerender(&parse(&infix), None);
}

fn random_source(rng: &mut Lcg, len: usize) -> String {
    let mut out = String::new();
    while out.chars().count() < len {
        if rng.gen_range(0, 4) == 0 {
            let idx = rng.gen_range(0, SNIPPETS.len());
            out.push_str(SNIPPETS.get(idx).copied().unwrap_or(""));
        } else {
            let idx = rng.gen_range(0, CHARSET.len());
            out.push(CHARSET.get(idx).copied().unwrap_or(' '));
        }
    }
    out
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        let span = max - min;
        let value = (self.next() >> 1) as usize;
        min + (value % span)
    }
}
