//! Waxeye backend
//!
//! PEG tool with `name <- body` definitions, prefix repetition operators
//! (`*a`, `+a`, `?a`) and bracketed character sets negated by a leading
//! `!`, so the merge strategy with an outer negation hook fits directly.

use crate::backend::Backend;
use crate::charclass::{CharClassStrategy, MergeStyle};

#[derive(Debug)]
pub struct WaxeyeBackend;

impl Backend for WaxeyeBackend {
    fn name(&self) -> &str {
        "waxeye"
    }

    fn description(&self) -> &str {
        "Waxeye, https://waxeye.org/"
    }

    fn grammar_extension(&self) -> &str {
        "waxeye"
    }

    fn assignment_operator(&self) -> &str {
        " <- "
    }

    fn single_line_comment_start(&self) -> &str {
        "# "
    }

    fn char_class_strategy(&self) -> CharClassStrategy {
        CharClassStrategy::Merge(MergeStyle {
            set_open: "[",
            set_close: "]",
            range_separator: "-",
            negate_inner: "",
            negate_outer: "!",
        })
    }

    fn wrap_zero_or_more(&self, inner: &str) -> String {
        format!("*{}", inner)
    }

    fn wrap_one_or_more(&self, inner: &str) -> String {
        format!("+{}", inner)
    }

    fn wrap_zero_or_one(&self, inner: &str) -> String {
        format!("?{}", inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::grammar::{Grammar, GrammarMeta, SectionKind};
    use crate::ast::node::Node;
    use crate::generator::transpile;

    #[test]
    fn test_prefix_operators_and_arrow() {
        let mut g = Grammar::new(GrammarMeta {
            id: "toy".to_string(),
            title: "toy".to_string(),
            ..GrammarMeta::default()
        });
        g.section_mut(SectionKind::Chars)
            .push(Node::name("digit", Node::char_range('0', '9', false)));
        g.section_mut(SectionKind::Prods).push(Node::name(
            "number",
            Node::iter(Node::reference("digit"), 1, None).unwrap(),
        ));
        let result = transpile(&WaxeyeBackend, &g).unwrap();
        assert!(result.text.contains("number <- +digit"));
        assert!(result.text.contains("digit <- [0-9]"));
    }

    #[test]
    fn test_negation_is_outer_bang() {
        let mut g = Grammar::new(GrammarMeta::default());
        g.section_mut(SectionKind::Chars).push(Node::name(
            "not_digit",
            Node::union(vec![Node::char_range('0', '9', false)], true),
        ));
        let result = transpile(&WaxeyeBackend, &g).unwrap();
        assert!(result.text.contains("not_digit <- ![0-9]"));
    }
}
