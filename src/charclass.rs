//! Character-class algebra
//!
//! Every character-set node (`CharClass`, `CharRange`, `WellKnown`,
//! `CharClassUnion`) reduces to a finite set of half-open code-point
//! intervals via [`char_ranges`]. On top of that sit the operations the
//! generator needs: merging runs, complementing within a universe
//! ([`to_positive_union`], for backends with no negation syntax), and the
//! two rendering strategies backends choose between:
//!
//! - **Merge**: coalesce everything into minimal sorted runs and print one
//!   bracketed set, `[a-z0-9_]` style, with independently configurable
//!   inner (`^`) and outer (`~`, `!`) negation hooks.
//! - **Keep**: for DSLs without bracketed sets, print the children
//!   separately and join them with a polarity-dependent separator; when the
//!   polarity's joiner is not configured the set is first rewritten through
//!   [`to_positive_union`].
//!
//! The rendering itself lives in the generator (it needs the backend's
//! escapers and recursion); this module owns the set arithmetic, the
//! strategy configuration and the well-known class table.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use once_cell::sync::Lazy;

use crate::ast::grammar::{Grammar, SectionKind};
use crate::ast::node::{Node, NodeKind};

/// The default code-point universe for complementing negated sets.
/// Byte-oriented grammars are the common target; callers with wider
/// alphabets pass their own universe.
pub const DEFAULT_UNIVERSE: Range<u32> = 0..0x100;

/// Error raised while reducing a node to character ranges.
#[derive(Debug, Clone, PartialEq)]
pub enum CharSetError {
    /// A `Ref` inside a character class that no `chars` rule binds.
    UnresolvedReference { name: String },
    /// A `WellKnown` name missing from the built-in table.
    UnknownWellKnown { name: String },
    /// A node that is not a character-set node where one was required.
    NotACharSet { found: NodeKind },
}

impl fmt::Display for CharSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharSetError::UnresolvedReference { name } => {
                write!(f, "character class references unknown rule '{}'", name)
            }
            CharSetError::UnknownWellKnown { name } => {
                write!(f, "unknown well-known character class '{}'", name)
            }
            CharSetError::NotACharSet { found } => {
                write!(f, "{} is not a character-set node", found)
            }
        }
    }
}

impl std::error::Error for CharSetError {}

/// The built-in well-known character classes, by the names grammars use to
/// reference them. Built once, never mutated afterwards.
pub static WELL_KNOWN: Lazy<BTreeMap<&'static str, Vec<Range<u32>>>> = Lazy::new(|| {
    const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";
    const WHITESPACE: &str = " \t\n\r\x0b\x0c";
    let mut table = BTreeMap::new();
    let mut put = |name: &'static str, chars: String| {
        table.insert(name, merge_ranges(chars_to_ranges(&chars)));
    };
    put("digits", ('0'..='9').collect());
    put("ascii_lowercase", ('a'..='z').collect());
    put("ascii_uppercase", ('A'..='Z').collect());
    put(
        "ascii_letters",
        ('a'..='z').chain('A'..='Z').collect(),
    );
    put(
        "hexdigits",
        ('0'..='9').chain('a'..='f').chain('A'..='F').collect(),
    );
    put("octdigits", ('0'..='7').collect());
    put("whitespace", WHITESPACE.to_string());
    put("punctuation", PUNCTUATION.to_string());
    put(
        "printable",
        ('0'..='9')
            .chain('a'..='z')
            .chain('A'..='Z')
            .chain(PUNCTUATION.chars())
            .chain(WHITESPACE.chars())
            .collect(),
    );
    table
});

/// One half-open interval per character, in input order, unmerged.
pub fn chars_to_ranges(chars: &str) -> Vec<Range<u32>> {
    chars.chars().map(|c| c as u32..c as u32 + 1).collect()
}

/// Coalesce intervals into the minimal sorted list of disjoint runs.
/// Adjacent runs merge; empty input intervals are dropped.
pub fn merge_ranges(ranges: impl IntoIterator<Item = Range<u32>>) -> Vec<Range<u32>> {
    let mut ranges: Vec<Range<u32>> = ranges.into_iter().filter(|r| r.start < r.end).collect();
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut merged: Vec<Range<u32>> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match merged.last_mut() {
            Some(last) if r.start <= last.end => {
                last.end = last.end.max(r.end);
            }
            _ => merged.push(r),
        }
    }
    merged
}

/// The complement of `taken` within `universe`: multi-range subtraction.
pub fn subtract_ranges(universe: Range<u32>, taken: &[Range<u32>]) -> Vec<Range<u32>> {
    let mut result = Vec::new();
    let mut cursor = universe.start;
    for r in merge_ranges(taken.iter().cloned()) {
        if r.end <= universe.start || r.start >= universe.end {
            continue;
        }
        if r.start > cursor {
            result.push(cursor..r.start.min(universe.end));
        }
        cursor = cursor.max(r.end);
    }
    if cursor < universe.end {
        result.push(cursor..universe.end);
    }
    result
}

/// The polarity of a character-set node; `None` for non-set nodes.
pub fn polarity(node: &Node) -> Option<bool> {
    match node {
        Node::CharClass { negative, .. }
        | Node::CharRange { negative, .. }
        | Node::WellKnown { negative, .. }
        | Node::CharClassUnion { negative, .. } => Some(*negative),
        _ => None,
    }
}

/// Reduce a character-set node to intervals. The result covers the node's
/// *content*; polarity is reported separately (see [`polarity`]) and
/// applied by [`to_positive_union`] or the rendering hooks. `Ref` children
/// of a union resolve against the grammar's `chars` section.
pub fn char_ranges(node: &Node, grammar: Option<&Grammar>) -> Result<Vec<Range<u32>>, CharSetError> {
    match node {
        Node::CharClass { chars, .. } => Ok(chars_to_ranges(chars)),
        Node::CharRange { first, last, .. } => Ok(vec![*first..*last + 1]),
        Node::WellKnown { name, .. } => WELL_KNOWN
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| CharSetError::UnknownWellKnown { name: name.clone() }),
        Node::CharClassUnion { children, .. } => {
            let mut ranges = Vec::new();
            for child in children {
                match child {
                    Node::Ref { name } => {
                        let resolved = grammar
                            .and_then(|g| g.section(SectionKind::Chars).find(name))
                            .ok_or_else(|| CharSetError::UnresolvedReference {
                                name: name.clone(),
                            })?;
                        ranges.extend(char_ranges(resolved, grammar)?);
                    }
                    _ => ranges.extend(char_ranges(child, grammar)?),
                }
            }
            Ok(ranges)
        }
        _ => Err(CharSetError::NotACharSet { found: node.kind() }),
    }
}

/// An equivalent non-negated `CharClassUnion` for any character-set node:
/// negated sets are complemented within `universe`. Used when a backend
/// has no negation syntax for the node's rendering path.
pub fn to_positive_union(
    node: &Node,
    grammar: Option<&Grammar>,
    universe: Range<u32>,
) -> Result<Node, CharSetError> {
    let mut ranges = char_ranges(node, grammar)?;
    if polarity(node) == Some(true) {
        ranges = subtract_ranges(universe, &ranges);
    } else {
        ranges = merge_ranges(ranges);
    }
    let children = ranges
        .into_iter()
        .map(|r| Node::CharRange {
            first: r.start,
            last: r.end - 1,
            negative: false,
        })
        .collect();
    Ok(Node::CharClassUnion {
        children,
        negative: false,
    })
}

/// How a backend renders character sets: one bracketed set of merged runs,
/// or an explicit join of the children.
#[derive(Debug, Clone)]
pub enum CharClassStrategy {
    Merge(MergeStyle),
    Keep(KeepStyle),
}

/// Configuration for the merge strategy.
#[derive(Debug, Clone)]
pub struct MergeStyle {
    pub set_open: &'static str,
    pub set_close: &'static str,
    /// Separator between run bounds inside the set.
    pub range_separator: &'static str,
    /// Prefix inside the delimiters for negated sets.
    pub negate_inner: &'static str,
    /// Prefix outside the delimiters for negated sets.
    pub negate_outer: &'static str,
}

impl Default for MergeStyle {
    fn default() -> Self {
        MergeStyle {
            set_open: "[",
            set_close: "]",
            range_separator: "-",
            negate_inner: "^",
            negate_outer: "",
        }
    }
}

/// Configuration for the keep strategy.
#[derive(Debug, Clone)]
pub struct KeepStyle {
    /// Joiner for positive sets (e.g. `|`). `None` forces the positive-
    /// union rewrite for positive sets.
    pub positive_joiner: Option<&'static str>,
    /// Joiner for negative sets (e.g. `-`). `None` forces the positive-
    /// union rewrite for negative sets.
    pub negative_joiner: Option<&'static str>,
    /// Delimiters around an explicit character enumeration.
    pub set_open: &'static str,
    pub set_close: &'static str,
    /// Separator for a standalone range, between two character literals.
    pub range_separator: &'static str,
    pub negate_inner: &'static str,
    pub negate_outer: &'static str,
    /// Render a multi-character `CharClass` as joined single-character
    /// literals instead of one delimited enumeration (for DSLs where
    /// `[abc]` means nothing).
    pub split_class_chars: bool,
}

impl Default for KeepStyle {
    fn default() -> Self {
        KeepStyle {
            positive_joiner: Some(" | "),
            negative_joiner: None,
            set_open: "[",
            set_close: "]",
            range_separator: "..",
            negate_inner: "",
            negate_outer: "",
            split_class_chars: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Escapers

/// A character escaper, chosen per backend.
pub type Escaper = fn(char) -> String;

fn common_escape(c: char) -> Option<String> {
    match c {
        '\\' => Some("\\\\".to_string()),
        '\n' => Some("\\n".to_string()),
        '\t' => Some("\\t".to_string()),
        '\r' => Some("\\r".to_string()),
        c if (c as u32) < 0x20 || (c as u32) == 0x7f => {
            Some(format!("\\u{:04X}", c as u32))
        }
        _ => None,
    }
}

/// Escapes backslash and control characters; leaves quotes alone.
pub fn common_escaper(c: char) -> String {
    common_escape(c).unwrap_or_else(|| c.to_string())
}

/// [`common_escaper`] plus `"` for double-quoted string literals.
pub fn double_tick_escaper(c: char) -> String {
    match c {
        '"' => "\\\"".to_string(),
        _ => common_escaper(c),
    }
}

/// [`common_escaper`] plus `'` for single-quoted string literals.
pub fn single_tick_escaper(c: char) -> String {
    match c {
        '\'' => "\\'".to_string(),
        _ => common_escaper(c),
    }
}

/// [`common_escaper`] plus the characters that are special inside a
/// bracketed set.
pub fn char_class_escaper(c: char) -> String {
    match c {
        ']' | '^' | '-' => format!("\\{}", c),
        _ => common_escaper(c),
    }
}

/// Escape a whole string through an [`Escaper`].
pub fn escape_str(escaper: Escaper, s: &str) -> String {
    s.chars().map(escaper).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_ranges_coalesces_and_sorts() {
        let merged = merge_ranges(vec![10..12, 0..3, 2..5, 12..13]);
        assert_eq!(merged, vec![0..5, 10..13]);
    }

    #[test]
    fn test_merge_ranges_drops_empty() {
        assert_eq!(merge_ranges(vec![5..5, 1..2]), vec![1..2]);
    }

    #[test]
    fn test_subtract_ranges_complement() {
        let taken = vec![2..4, 6..8];
        assert_eq!(subtract_ranges(0..10, &taken), vec![0..2, 4..6, 8..10]);
    }

    #[test]
    fn test_subtract_ranges_clips_to_universe() {
        let taken = vec![0..300];
        assert_eq!(subtract_ranges(0..256, &taken), Vec::<Range<u32>>::new());
        let taken = vec![250..260];
        assert_eq!(subtract_ranges(0..256, &taken), vec![0..250]);
    }

    #[test]
    fn test_char_ranges_of_class() {
        let node = Node::char_class("ab", false);
        assert_eq!(char_ranges(&node, None).unwrap(), vec![97..98, 98..99]);
    }

    #[test]
    fn test_char_ranges_of_range_is_inclusive() {
        let node = Node::char_range('0', '9', false);
        assert_eq!(char_ranges(&node, None).unwrap(), vec![48..58]);
    }

    #[test]
    fn test_union_resolves_refs_through_chars_section() {
        use crate::ast::grammar::{Grammar, GrammarMeta};
        let mut g = Grammar::new(GrammarMeta::default());
        g.section_mut(SectionKind::Chars)
            .push(Node::name("digit", Node::char_range('0', '9', false)));
        let union = Node::union(
            vec![Node::reference("digit"), Node::char_range('a', 'f', false)],
            false,
        );
        let ranges = merge_ranges(char_ranges(&union, Some(&g)).unwrap());
        assert_eq!(ranges, vec![48..58, 97..103]);
    }

    #[test]
    fn test_union_with_unresolved_ref_fails() {
        let union = Node::union(vec![Node::reference("nope")], false);
        assert_eq!(
            char_ranges(&union, None),
            Err(CharSetError::UnresolvedReference {
                name: "nope".to_string()
            })
        );
    }

    #[test]
    fn test_well_known_lookup() {
        let node = Node::well_known("digits", false);
        assert_eq!(char_ranges(&node, None).unwrap(), vec![48..58]);
        let node = Node::well_known("nonsense", false);
        assert!(matches!(
            char_ranges(&node, None),
            Err(CharSetError::UnknownWellKnown { .. })
        ));
    }

    #[test]
    fn test_to_positive_union_complements_negated_sets() {
        let node = Node::char_class("\u{1}", true);
        let pu = to_positive_union(&node, None, 0..4).unwrap();
        assert_eq!(
            char_ranges(&pu, None).unwrap(),
            vec![0..1, 2..4]
        );
        assert_eq!(polarity(&pu), Some(false));
    }

    #[test]
    fn test_to_positive_union_is_identity_on_positive_content() {
        let node = Node::union(
            vec![
                Node::char_range('b', 'c', false),
                Node::char_range('a', 'a', false),
            ],
            false,
        );
        let pu = to_positive_union(&node, None, DEFAULT_UNIVERSE).unwrap();
        assert_eq!(char_ranges(&pu, None).unwrap(), vec![97..100]);
    }

    #[test]
    fn test_double_negation_restores_ranges() {
        let node = Node::union(vec![Node::char_range('a', 'z', true)], true);
        let positive = to_positive_union(&node, None, DEFAULT_UNIVERSE).unwrap();
        // Negate the positive form again and complement once more.
        let negated = match positive {
            Node::CharClassUnion { children, .. } => Node::CharClassUnion {
                children,
                negative: true,
            },
            _ => unreachable!(),
        };
        let restored = to_positive_union(&negated, None, DEFAULT_UNIVERSE).unwrap();
        assert_eq!(char_ranges(&restored, None).unwrap(), vec![97..123]);
    }

    #[test]
    fn test_escapers() {
        assert_eq!(common_escaper('a'), "a");
        assert_eq!(common_escaper('\\'), "\\\\");
        assert_eq!(common_escaper('\n'), "\\n");
        assert_eq!(common_escaper('\x01'), "\\u0001");
        assert_eq!(double_tick_escaper('"'), "\\\"");
        assert_eq!(single_tick_escaper('\''), "\\'");
        assert_eq!(char_class_escaper(']'), "\\]");
        assert_eq!(char_class_escaper('-'), "\\-");
        assert_eq!(escape_str(double_tick_escaper, "a\"b"), "a\\\"b");
    }

    #[test]
    fn test_well_known_table_is_merged() {
        for ranges in WELL_KNOWN.values() {
            let merged = merge_ranges(ranges.clone());
            assert_eq!(&merged, ranges);
        }
    }
}
