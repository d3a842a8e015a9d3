//! ANTLR v4 backend
//!
//! Statement shape: `name: body;` with `=`-labelled captures. Character
//! classes keep their structure (ANTLR lexer sets compose with `|` and
//! negate with a leading `~`), so this backend runs the keep strategy.

use crate::ast::grammar::Grammar;
use crate::backend::{Backend, SectionId};
use crate::charclass::{single_tick_escaper, CharClassStrategy, Escaper, KeepStyle};

#[derive(Debug)]
pub struct AntlrBackend;

const SECTION_ORDER: &[SectionId] = &[
    SectionId::Prods,
    SectionId::Fragmented,
    SectionId::Keywords,
    SectionId::Tokens,
    SectionId::Chars,
];

impl Backend for AntlrBackend {
    fn name(&self) -> &str {
        "antlr"
    }

    fn description(&self) -> &str {
        "ANTLR v4, https://www.antlr.org/"
    }

    fn grammar_extension(&self) -> &str {
        "g4"
    }

    fn assignment_operator(&self) -> &str {
        ": "
    }

    fn end_statement(&self) -> &str {
        ";"
    }

    fn single_line_comment_start(&self) -> &str {
        "// "
    }

    fn capturing_operator(&self) -> Option<&str> {
        Some("=")
    }

    fn string_quote(&self) -> &str {
        "'"
    }

    fn string_escaper(&self) -> Escaper {
        single_tick_escaper
    }

    fn char_class_strategy(&self) -> CharClassStrategy {
        CharClassStrategy::Keep(KeepStyle {
            positive_joiner: Some(" | "),
            negative_joiner: None,
            set_open: "[",
            set_close: "]",
            range_separator: "..",
            negate_inner: "",
            negate_outer: "~",
            split_class_chars: false,
        })
    }

    fn section_order(&self) -> &[SectionId] {
        SECTION_ORDER
    }

    fn start_lines(&self, grammar: &Grammar) -> Vec<String> {
        vec![format!("grammar {};", grammar.meta.id), String::new()]
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
            id: "Toy".to_string(),
            title: "Toy".to_string(),
            ..GrammarMeta::default()
        });
        g.section_mut(SectionKind::Chars).push(Node::name(
            "digit",
            Node::char_range('0', '9', false),
        ));
        g.section_mut(SectionKind::Prods).push(Node::name(
            "number",
            Node::iter(Node::reference("digit"), 1, None).unwrap(),
        ));
        g
    }

    #[test]
    fn test_grammar_declaration_line() {
        let result = transpile(&AntlrBackend, &grammar()).unwrap();
        assert!(result.text.contains("grammar Toy;"));
    }

    #[test]
    fn test_rule_statement_shape() {
        let result = transpile(&AntlrBackend, &grammar()).unwrap();
        assert!(result.text.contains("number: digit+;"));
        assert!(result.text.contains("digit: '0'..'9';"));
    }

    #[test]
    fn test_negated_class_uses_tilde() {
        let mut g = grammar();
        g.section_mut(SectionKind::Chars).push(Node::name(
            "not_brace",
            Node::char_class("{}", true),
        ));
        let result = transpile(&AntlrBackend, &g).unwrap();
        assert!(result.text.contains("not_brace: ~[{}];"));
    }

    #[test]
    fn test_negated_range_uses_tilde() {
        let mut g = grammar();
        g.section_mut(SectionKind::Chars).push(Node::name(
            "not_lower",
            Node::char_range('a', 'z', true),
        ));
        let result = transpile(&AntlrBackend, &g).unwrap();
        assert!(result.text.contains("not_lower: ~'a'..'z';"));
    }
}
