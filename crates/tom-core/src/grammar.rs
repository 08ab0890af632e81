//! Static tag tables. Built once, read-only afterwards.

use std::collections::HashMap;

use once_cell::sync::Lazy;

pub const DICE: &str = "dice";
pub const CALC: &str = "calc";
pub const CALCN: &str = "calcn";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TagKind {
    /// Children run until the matching `[/name]` or end of input.
    Container,
    /// Never consumes children at parse time.
    SelfClosing,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TagSpec {
    pub name: &'static str,
    pub kind: TagKind,
    /// Self-closing tag that may be followed by a persisted integer result
    /// and its closer, e.g. `[dice 1 6]3[/dice]`.
    pub stores_result: bool,
    /// The whole attribute text is kept verbatim as one `Text` attribute.
    pub raw_attribute: bool,
}

impl TagSpec {
    const fn container(name: &'static str) -> Self {
        Self {
            name,
            kind: TagKind::Container,
            stores_result: false,
            raw_attribute: false,
        }
    }

    const fn self_closing(name: &'static str) -> Self {
        Self {
            name,
            kind: TagKind::SelfClosing,
            stores_result: false,
            raw_attribute: false,
        }
    }

    pub fn is_self_closing(&self) -> bool {
        self.kind == TagKind::SelfClosing
    }
}

const TAG_SPECS: &[TagSpec] = &[
    TagSpec::container("bld"),
    TagSpec::container("itl"),
    TagSpec::container("udl"),
    TagSpec::container("strk"),
    TagSpec::container("sup"),
    TagSpec::container("sub"),
    TagSpec::container("clr"),
    TagSpec::container("size"),
    TagSpec::container("quote"),
    TagSpec::container("spoiler"),
    TagSpec::container("code"),
    TagSpec::container("link"),
    TagSpec::container(CALC),
    TagSpec {
        raw_attribute: true,
        ..TagSpec::container(CALCN)
    },
    TagSpec::self_closing("hr"),
    TagSpec::self_closing("img"),
    TagSpec::self_closing("youtube"),
    TagSpec {
        stores_result: true,
        ..TagSpec::self_closing(DICE)
    },
];

// (legacy spelling, canonical name, implied leading attributes)
const ALIAS_SPECS: &[(&str, &str, &[&str])] = &[
    ("clrred", "clr", &["red"]),
    ("clrblue", "clr", &["blue"]),
    ("clrgreen", "clr", &["green"]),
    ("b", "bld", &[]),
    ("i", "itl", &[]),
    ("u", "udl", &[]),
    ("s", "strk", &[]),
];

static TAGS: Lazy<HashMap<&'static str, TagSpec>> =
    Lazy::new(|| TAG_SPECS.iter().map(|spec| (spec.name, *spec)).collect());

static ALIASES: Lazy<HashMap<&'static str, Alias>> = Lazy::new(|| {
    ALIAS_SPECS
        .iter()
        .map(|&(alias, canonical, implied)| (alias, Alias { canonical, implied }))
        .collect()
});

#[derive(Clone, Copy, Debug)]
struct Alias {
    canonical: &'static str,
    implied: &'static [&'static str],
}

/// A tag name after alias resolution.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedTag {
    pub spec: &'static TagSpec,
    pub implied_attributes: &'static [&'static str],
}

/// Resolves a tag name as written in the source (any ASCII case, canonical or
/// legacy spelling).
pub fn resolve_tag(name: &str) -> Option<ResolvedTag> {
    let lowered = name.to_ascii_lowercase();
    if let Some(spec) = TAGS.get(lowered.as_str()) {
        return Some(ResolvedTag {
            spec,
            implied_attributes: &[],
        });
    }
    let alias = ALIASES.get(lowered.as_str())?;
    let spec = TAGS.get(alias.canonical)?;
    Some(ResolvedTag {
        spec,
        implied_attributes: alias.implied,
    })
}

/// Looks up a canonical name only.
pub fn tag_spec(name: &str) -> Option<&'static TagSpec> {
    TAGS.get(name)
}

pub fn is_self_closing(name: &str) -> bool {
    tag_spec(name).is_some_and(TagSpec::is_self_closing)
}

#[cfg(test)]
mod tests {
    use super::{is_self_closing, resolve_tag};

    #[test]
    fn aliases_resolve_to_canonical_specs() {
        let resolved = resolve_tag("clrred").expect("alias");
        assert_eq!(resolved.spec.name, "clr");
        assert_eq!(resolved.implied_attributes, &["red"]);

        let resolved = resolve_tag("B").expect("alias");
        assert_eq!(resolved.spec.name, "bld");
        assert!(resolved.implied_attributes.is_empty());
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert!(resolve_tag("blink").is_none());
        assert!(resolve_tag("").is_none());
    }

    #[test]
    fn self_closing_membership_is_static() {
        assert!(is_self_closing("dice"));
        assert!(is_self_closing("hr"));
        assert!(!is_self_closing("calc"));
        assert!(!is_self_closing("clrred"));
    }
}
