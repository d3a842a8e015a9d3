//! Property-based tests for the character-class algebra
//!
//! Two laws hold over the byte universe `[0, 256)`:
//! - complementing a negated set yields exactly the complement of its
//!   content, and complementing twice restores the original ranges;
//! - rendering any set through the merge strategy and re-parsing the
//!   bracketed output recovers the same integer-range set.

use std::ops::Range;

use proptest::prelude::*;

use grambel::ast::grammar::{Grammar, GrammarMeta};
use grambel::ast::node::Node;
use grambel::backend::Backend;
use grambel::charclass::{char_ranges, merge_ranges, polarity, subtract_ranges, to_positive_union};
use grambel::generator::Generator;

/// A backend with entirely default spelling, used to drive the merge
/// strategy the way any plain bracketed-set DSL would.
#[derive(Debug)]
struct PlainMerge;

impl Backend for PlainMerge {
    fn name(&self) -> &str {
        "plain-merge"
    }
    fn grammar_extension(&self) -> &str {
        "g"
    }
    fn assignment_operator(&self) -> &str {
        ": "
    }
    fn single_line_comment_start(&self) -> &str {
        "// "
    }
}

fn empty_grammar() -> Grammar {
    Grammar::new(GrammarMeta::default())
}

/// Strategy: a handful of inclusive byte ranges, as (start, extra) pairs.
fn ranges_strategy() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((any::<u8>(), 0u8..64), 1..6)
}

fn union_from(ranges: &[(u8, u8)], negative: bool) -> Node {
    let children = ranges
        .iter()
        .map(|&(start, extra)| Node::CharRange {
            first: start as u32,
            last: (start as u32 + extra as u32).min(255),
            negative: false,
        })
        .collect();
    Node::CharClassUnion { children, negative }
}

/// Trivial re-parser for `[...]` sets as the merge strategy prints them:
/// escaped characters, and `-` between run bounds.
fn parse_bracketed_set(rendered: &str) -> Vec<Range<u32>> {
    let inner = rendered
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .expect("merge output is bracketed");

    #[derive(PartialEq)]
    enum Token {
        Point(u32),
        Dash,
    }

    let mut tokens = Vec::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next().expect("dangling escape");
                let cp = match escaped {
                    'n' => '\n' as u32,
                    't' => '\t' as u32,
                    'r' => '\r' as u32,
                    'u' => {
                        let hex: String = (0..4).map(|_| chars.next().expect("short \\u")).collect();
                        u32::from_str_radix(&hex, 16).expect("bad \\u hex")
                    }
                    other => other as u32,
                };
                tokens.push(Token::Point(cp));
            }
            '-' => tokens.push(Token::Dash),
            other => tokens.push(Token::Point(other as u32)),
        }
    }

    let mut ranges = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match (&tokens[i], tokens.get(i + 1), tokens.get(i + 2)) {
            (Token::Point(start), Some(Token::Dash), Some(Token::Point(end))) => {
                ranges.push(*start..*end + 1);
                i += 3;
            }
            (Token::Point(cp), _, _) => {
                ranges.push(*cp..*cp + 1);
                i += 1;
            }
            (Token::Dash, _, _) => panic!("stray dash in set"),
        }
    }
    ranges
}

proptest! {
    #[test]
    fn complement_law(ranges in ranges_strategy()) {
        let negated = union_from(&ranges, true);
        let content = merge_ranges(char_ranges(&negated, None).unwrap());

        let positive = to_positive_union(&negated, None, 0..256).unwrap();
        prop_assert_eq!(polarity(&positive), Some(false));
        let positive_ranges = merge_ranges(char_ranges(&positive, None).unwrap());
        prop_assert_eq!(&positive_ranges, &subtract_ranges(0..256, &content));

        // Negating the positive form and complementing again restores the
        // original range set.
        let renegated = match positive {
            Node::CharClassUnion { children, .. } => Node::CharClassUnion {
                children,
                negative: true,
            },
            _ => unreachable!("positive unions stay unions"),
        };
        let restored = to_positive_union(&renegated, None, 0..256).unwrap();
        let restored_ranges = merge_ranges(char_ranges(&restored, None).unwrap());
        prop_assert_eq!(restored_ranges, content);
    }

    #[test]
    fn merge_render_round_trips(ranges in ranges_strategy()) {
        let node = union_from(&ranges, false);
        let grammar = empty_grammar();
        let rendered = Generator::new(&PlainMerge)
            .resolve(&node, &grammar)
            .unwrap();
        let reparsed = merge_ranges(parse_bracketed_set(&rendered));
        let expected = merge_ranges(char_ranges(&node, None).unwrap());
        prop_assert_eq!(reparsed, expected);
    }

    #[test]
    fn merge_render_of_explicit_class_round_trips(chars in prop::collection::vec(0u8..=255, 2..12)) {
        let class: String = chars
            .iter()
            .map(|&b| char::from_u32(b as u32).unwrap())
            .collect();
        let node = Node::char_class(class, false);
        let grammar = empty_grammar();
        let rendered = Generator::new(&PlainMerge)
            .resolve(&node, &grammar)
            .unwrap();
        let reparsed = merge_ranges(parse_bracketed_set(&rendered));
        let expected = merge_ranges(char_ranges(&node, None).unwrap());
        prop_assert_eq!(reparsed, expected);
    }
}
