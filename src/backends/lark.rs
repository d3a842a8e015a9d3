//! Lark backend
//!
//! `name: body` definitions, `//` comments, and regex-literal character
//! sets (`/[a-z0-9]/`), which the merge strategy produces directly by
//! using the regex delimiters as the set fence. Lark expects a fixed
//! `start` entry rule, so one is synthesized from the first production.

use crate::ast::grammar::Grammar;
use crate::backend::{Backend, SectionId};
use crate::charclass::{CharClassStrategy, MergeStyle};

#[derive(Debug)]
pub struct LarkBackend;

const SECTION_ORDER: &[SectionId] = &[
    SectionId::FirstRule,
    SectionId::Prods,
    SectionId::Fragmented,
    SectionId::Keywords,
    SectionId::Chars,
    SectionId::Tokens,
];

impl Backend for LarkBackend {
    fn name(&self) -> &str {
        "lark"
    }

    fn description(&self) -> &str {
        "Lark, https://github.com/lark-parser/lark"
    }

    fn grammar_extension(&self) -> &str {
        "lark"
    }

    fn assignment_operator(&self) -> &str {
        ": "
    }

    fn single_line_comment_start(&self) -> &str {
        "// "
    }

    fn char_class_strategy(&self) -> CharClassStrategy {
        CharClassStrategy::Merge(MergeStyle {
            set_open: "/[",
            set_close: "]/",
            range_separator: "-",
            negate_inner: "^",
            negate_outer: "",
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
        g.section_mut(SectionKind::Chars).push(Node::name(
            "hex_digit",
            Node::union(
                vec![
                    Node::char_range('0', '9', false),
                    Node::char_range('a', 'f', false),
                ],
                false,
            ),
        ));
        g.section_mut(SectionKind::Prods).push(Node::name(
            "color",
            Node::iter(Node::reference("hex_digit"), 1, None).unwrap(),
        ));
        g
    }

    #[test]
    fn test_regex_delimited_sets() {
        let result = transpile(&LarkBackend, &grammar()).unwrap();
        assert!(result.text.contains("hex_digit: /[0-9a-f]/"));
    }

    #[test]
    fn test_start_rule_binding() {
        let result = transpile(&LarkBackend, &grammar()).unwrap();
        assert!(result.text.contains("start: color"));
    }

    #[test]
    fn test_negation_goes_inside_the_set() {
        let mut g = grammar();
        g.section_mut(SectionKind::Chars).push(Node::name(
            "not_newline",
            Node::union(vec![Node::char_class("\n", false)], true),
        ));
        let result = transpile(&LarkBackend, &g).unwrap();
        assert!(result.text.contains("not_newline: /[^\\n]/"));
    }
}
