//! pest backend
//!
//! Rules are `name = { body }` with `~` between sequence elements. pest has
//! no bracketed character sets: ranges are spelled `'a'..'z'` and sets are
//! alternations of those, which is exactly the keep strategy with split
//! character classes. Negated sets complement into their positive form
//! (pest's `!` is a predicate, not a set operator).

use crate::ast::grammar::Grammar;
use crate::backend::{Backend, SectionId};
use crate::charclass::{single_tick_escaper, CharClassStrategy, KeepStyle};

#[derive(Debug)]
pub struct PestBackend;

const SECTION_ORDER: &[SectionId] = &[
    SectionId::FirstRule,
    SectionId::Prods,
    SectionId::Fragmented,
    SectionId::Keywords,
    SectionId::Chars,
    SectionId::Tokens,
];

impl Backend for PestBackend {
    fn name(&self) -> &str {
        "pest"
    }

    fn description(&self) -> &str {
        "pest, https://pest.rs/"
    }

    fn grammar_extension(&self) -> &str {
        "pest"
    }

    fn assignment_operator(&self) -> &str {
        " = "
    }

    fn single_line_comment_start(&self) -> &str {
        "// "
    }

    fn sequence_separator(&self) -> &str {
        " ~ "
    }

    fn rule_statement(&self, name: &str, body: &str) -> String {
        format!("{} = {{ {} }}", name, body)
    }

    fn wrap_literal_char(&self, c: char) -> String {
        // Character literals (as used in ranges) are single-quoted.
        format!("'{}'", single_tick_escaper(c))
    }

    fn char_class_strategy(&self) -> CharClassStrategy {
        CharClassStrategy::Keep(KeepStyle {
            positive_joiner: Some(" | "),
            negative_joiner: None,
            set_open: "",
            set_close: "",
            range_separator: "..",
            negate_inner: "",
            negate_outer: "",
            split_class_chars: true,
        })
    }

    fn section_order(&self) -> &[SectionId] {
        SECTION_ORDER
    }

    fn synthesize_start_rule(&self) -> bool {
        true
    }

    fn start_lines(&self, _grammar: &Grammar) -> Vec<String> {
        vec![String::new()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::grammar::{GrammarMeta, SectionKind};
    use crate::ast::node::Node;
    use crate::generator::transpile;

    fn grammar() -> Grammar {
        let mut g = Grammar::new(GrammarMeta {
            id: "toy".to_string(),
            title: "toy".to_string(),
            ..GrammarMeta::default()
        });
        g.section_mut(SectionKind::Chars)
            .push(Node::name("digit", Node::char_range('0', '9', false)));
        g.section_mut(SectionKind::Prods).push(Node::name(
            "pair",
            Node::seq(vec![Node::reference("digit"), Node::reference("digit")]),
        ));
        g
    }

    #[test]
    fn test_braced_rules_and_tilde_sequences() {
        let result = transpile(&PestBackend, &grammar()).unwrap();
        // Sequence bodies group under their rule binding.
        assert!(result.text.contains("pair = { (digit ~ digit) }"));
        assert!(result.text.contains("digit = { '0'..'9' }"));
    }

    #[test]
    fn test_start_rule_is_synthesized() {
        let result = transpile(&PestBackend, &grammar()).unwrap();
        assert!(result.text.contains("start = { pair }"));
    }

    #[test]
    fn test_char_class_splits_into_literals() {
        let mut g = grammar();
        g.section_mut(SectionKind::Chars)
            .push(Node::name("sign", Node::char_class("+-", false)));
        let result = transpile(&PestBackend, &g).unwrap();
        assert!(result.text.contains("sign = { '+' | '-' }"));
    }

    #[test]
    fn test_negated_set_complements() {
        let mut g = grammar();
        g.section_mut(SectionKind::Chars).push(Node::name(
            "not_nul",
            Node::union(vec![Node::char_range('\u{0}', '\u{0}', false)], true),
        ));
        let result = transpile(&PestBackend, &g).unwrap();
        assert!(result.text.contains("not_nul = { '\\u0001'..'ÿ' }"));
    }
}
