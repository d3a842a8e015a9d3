//! parglare backend
//!
//! LR tool with `name: body;` rules, `=`-labelled captures and explicit
//! shift/reduce preferences spelled as `{shift}` / `{reduce}` after the
//! preferred production. The preference hook is the reason this backend
//! exists in the bundle: it exercises the grouping rule that fires only
//! when a backend actually renders `Prefer` nodes.

use crate::ast::node::Preference;
use crate::backend::Backend;

#[derive(Debug)]
pub struct ParglareBackend;

impl Backend for ParglareBackend {
    fn name(&self) -> &str {
        "parglare"
    }

    fn description(&self) -> &str {
        "parglare, https://github.com/igordejanovic/parglare"
    }

    fn grammar_extension(&self) -> &str {
        "pg"
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

    fn handles_prefer(&self) -> bool {
        true
    }

    fn wrap_prefer(&self, inner: &str, preference: Preference) -> String {
        format!("{} {{{}}}", inner, preference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::grammar::{Grammar, GrammarMeta, SectionKind};
    use crate::ast::node::Node;
    use crate::generator::transpile;

    #[test]
    fn test_preference_annotation() {
        let mut g = Grammar::new(GrammarMeta {
            id: "expr".to_string(),
            title: "expr".to_string(),
            ..GrammarMeta::default()
        });
        let body = Node::prefer(
            Node::seq(vec![
                Node::reference("expr"),
                Node::lit("+"),
                Node::reference("expr"),
            ]),
            Preference::Shift,
        )
        .unwrap();
        g.section_mut(SectionKind::Prods)
            .push(Node::name("sum", body));
        let result = transpile(&ParglareBackend, &g).unwrap();
        // A rendered preference groups its subtree.
        assert!(result.text.contains("sum: (expr \"+\" expr {shift});"));
    }

    #[test]
    fn test_capture_labels() {
        let mut g = Grammar::new(GrammarMeta::default());
        g.section_mut(SectionKind::Prods).push(Node::name(
            "assign",
            Node::seq(vec![
                Node::cap("target", Node::reference("ident")),
                Node::lit("="),
                Node::cap("value", Node::reference("expr")),
            ]),
        ));
        let result = transpile(&ParglareBackend, &g).unwrap();
        assert!(result.text.contains("assign: (target=ident \"=\" value=expr);"));
    }
}
