//! The bundled "delimited" template: a list of items with separators
//!
//! `items: delimited(part: item, delimiter: ",")` expands to a head
//! capture plus a recursive tail rule pair:
//!
//! ```text
//! items: first_item=item rest_items_with_del=rest_items_with_delF
//! rest_items_with_delF: rest_item_with_delF*
//! rest_item_with_delF: "," rest_item=item
//! ```
//!
//! All derived names come from the target rule's name, so instantiating
//! the template in several rules never collides. The target name must be a
//! plural (`items` -> `item`) unless `single_item_name` says otherwise.

use std::collections::BTreeMap;

use crate::ast::grammar::{Fragment, Grammar, SectionKind};
use crate::ast::node::{Node, TemplateArg};

use super::{Expansion, ParamKind, ParamSpec, Template, TemplateError};

pub struct Delimited;

const SCHEMA: &[ParamSpec] = &[
    ParamSpec {
        name: "part",
        kind: ParamKind::Node,
        required: true,
    },
    ParamSpec {
        name: "delimiter",
        kind: ParamKind::Node,
        required: true,
    },
    ParamSpec {
        name: "single_item_name",
        kind: ParamKind::Literal,
        required: false,
    },
];

/// The names one instantiation derives from its target rule.
#[derive(Debug)]
struct DerivedNames {
    first_item_cap: String,
    rest_item_cap: String,
    rest_items_cap: String,
    rest_items_prod: String,
    rest_item_prod: String,
}

impl DerivedNames {
    fn derive(
        items_name: &str,
        single_item_name: Option<&str>,
    ) -> Result<DerivedNames, TemplateError> {
        let single = match single_item_name {
            Some(name) => name.to_string(),
            None => match items_name.strip_suffix('s') {
                Some(stem) if !stem.is_empty() => stem.to_string(),
                _ => {
                    return Err(TemplateError::NameDerivation {
                        rule: items_name.to_string(),
                        reason: "name must end with 's' so the single-item name can be derived; \
                                 pass single_item_name otherwise"
                            .to_string(),
                    })
                }
            },
        };
        let first_item_cap = format!("first_{}", single);
        let rest_item_cap = format!("rest_{}", single);
        let rest_item_with_del = format!("{}_with_del", rest_item_cap);
        let rest_items_with_del = format!("{}s_with_del", rest_item_cap);
        Ok(DerivedNames {
            first_item_cap,
            rest_item_cap,
            rest_items_prod: format!("{}F", rest_items_with_del),
            rest_item_prod: format!("{}F", rest_item_with_del),
            rest_items_cap: rest_items_with_del,
        })
    }
}

impl Template for Delimited {
    fn id(&self) -> &str {
        "delimited"
    }

    fn params_schema(&self) -> &[ParamSpec] {
        SCHEMA
    }

    fn expand(
        &self,
        _grammar: &Grammar,
        rule_name: &str,
        params: &BTreeMap<String, TemplateArg>,
    ) -> Result<Expansion, TemplateError> {
        let TemplateArg::Node(part) = &params["part"] else {
            unreachable!("schema-checked")
        };
        let TemplateArg::Node(delimiter) = &params["delimiter"] else {
            unreachable!("schema-checked")
        };
        let single_item_name = params.get("single_item_name").and_then(|arg| match arg {
            TemplateArg::Literal(s) => Some(s.as_str()),
            TemplateArg::Node(_) => None,
        });
        let names = DerivedNames::derive(rule_name, single_item_name)?;

        let replacement = Node::seq(vec![
            Node::cap(names.first_item_cap.as_str(), part.clone()),
            Node::cap(
                names.rest_items_cap.as_str(),
                Node::reference(names.rest_items_prod.as_str()),
            ),
        ]);

        let mut fragment = Fragment::new();
        let prods = fragment.section_mut(SectionKind::Prods);
        prods.push(Node::name(
            names.rest_items_prod.as_str(),
            Node::Iter {
                child: Box::new(Node::reference(names.rest_item_prod.as_str())),
                min: 0,
                max: None,
            },
        ));
        prods.push(Node::name(
            names.rest_item_prod.as_str(),
            Node::seq(vec![
                delimiter.clone(),
                Node::cap(names.rest_item_cap.as_str(), part.clone()),
            ]),
        ));

        Ok(Expansion {
            replacement,
            fragment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::grammar::GrammarMeta;
    use crate::ast::node::NodeKind;
    use crate::ast::rewrite::for_each_node;
    use crate::templates::{expand_templates, TemplateRegistry};

    fn delimited_instantiation() -> Node {
        let mut params = BTreeMap::new();
        params.insert(
            "part".to_string(),
            TemplateArg::Node(Node::reference("item")),
        );
        params.insert(
            "delimiter".to_string(),
            TemplateArg::Node(Node::lit(",")),
        );
        Node::TemplateInstantiation {
            template: "delimited".to_string(),
            params,
        }
    }

    fn grammar() -> Grammar {
        let mut g = Grammar::new(GrammarMeta {
            id: "list".to_string(),
            title: "list".to_string(),
            ..GrammarMeta::default()
        });
        g.section_mut(SectionKind::Tokens)
            .push(Node::name("item", Node::well_known("ascii_letters", false)));
        g.section_mut(SectionKind::Prods)
            .push(Node::name("items", delimited_instantiation()));
        g
    }

    #[test]
    fn test_expansion_leaves_no_instantiations() {
        let mut g = grammar();
        expand_templates(&mut g, &TemplateRegistry::with_defaults()).unwrap();
        let mut instantiations = 0;
        for section in g.sections() {
            for rule in section.children() {
                for_each_node(rule, None, &mut |n, _| {
                    if n.kind() == NodeKind::TemplateInstantiation {
                        instantiations += 1;
                    }
                    true
                });
            }
        }
        assert_eq!(instantiations, 0);
    }

    #[test]
    fn test_expansion_adds_tail_rules() {
        let mut g = grammar();
        expand_templates(&mut g, &TemplateRegistry::with_defaults()).unwrap();
        let (section, tail) = g.find_rule("rest_items_with_delF").unwrap();
        assert_eq!(section, SectionKind::Prods);
        assert_eq!(
            tail,
            &Node::Iter {
                child: Box::new(Node::reference("rest_item_with_delF")),
                min: 0,
                max: None,
            }
        );
        let (_, rest) = g.find_rule("rest_item_with_delF").unwrap();
        assert_eq!(
            rest,
            &Node::seq(vec![
                Node::lit(","),
                Node::cap("rest_item", Node::reference("item")),
            ])
        );
        // Expansion must keep the grammar's names globally unique.
        g.validate().unwrap();
    }

    #[test]
    fn test_replacement_captures_head_and_tail() {
        let mut g = grammar();
        expand_templates(&mut g, &TemplateRegistry::with_defaults()).unwrap();
        let (_, body) = g.find_rule("items").unwrap();
        assert_eq!(
            body,
            &Node::seq(vec![
                Node::cap("first_item", Node::reference("item")),
                Node::cap(
                    "rest_items_with_del",
                    Node::reference("rest_items_with_delF")
                ),
            ])
        );
    }

    #[test]
    fn test_singular_override() {
        let names = DerivedNames::derive("argv", Some("arg")).unwrap();
        assert_eq!(names.first_item_cap, "first_arg");
        assert_eq!(names.rest_items_prod, "rest_args_with_delF");
        assert_eq!(names.rest_item_prod, "rest_arg_with_delF");
    }

    #[test]
    fn test_underivable_name_fails() {
        let err = DerivedNames::derive("value", None).unwrap_err();
        assert!(matches!(err, TemplateError::NameDerivation { .. }));
    }
}
