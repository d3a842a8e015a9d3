//! IR snapshot - a normalized, serializable view of a grammar tree
//!
//! Downstream tooling (the wrapper generator, debugging surfaces, test
//! fixtures) wants to look at a grammar without depending on the IR enum
//! directly. The snapshot flattens every node to the same serde-friendly
//! triple (node type, label, children) so consumers focus on presentation
//! and never reimplement traversal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::grammar::Grammar;
use super::node::{Node, TemplateArg};

/// A normalized view of one IR node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// The node's variant name (e.g. "Ref", "Seq", "CharRange").
    pub node_type: String,
    /// The node's primary datum: a name, a literal value, a range, ...
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    /// Variant-specific attributes (polarity, bounds, preference).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    fn new(node_type: &str, label: impl Into<String>) -> Self {
        NodeSnapshot {
            node_type: node_type.to_string(),
            label: label.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    fn with_attribute(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    fn with_children(mut self, children: Vec<NodeSnapshot>) -> Self {
        self.children = children;
        self
    }
}

/// Snapshot a single node and everything under it.
pub fn snapshot_from_node(node: &Node) -> NodeSnapshot {
    match node {
        Node::Ref { name } => NodeSnapshot::new("Ref", name.clone()),
        Node::Lit { value } => NodeSnapshot::new("Lit", value.clone()),
        Node::CharClass { chars, negative } => {
            NodeSnapshot::new("CharClass", chars.clone()).with_attribute("negative", negative)
        }
        Node::CharRange {
            first,
            last,
            negative,
        } => NodeSnapshot::new("CharRange", format!("{:#x}-{:#x}", first, last))
            .with_attribute("negative", negative),
        Node::WellKnown { name, negative } => {
            NodeSnapshot::new("WellKnown", name.clone()).with_attribute("negative", negative)
        }
        Node::Name { name, child } => NodeSnapshot::new("Name", name.clone())
            .with_children(vec![snapshot_from_node(child)]),
        Node::Cap { name, child } => NodeSnapshot::new("Cap", name.clone())
            .with_children(vec![snapshot_from_node(child)]),
        Node::UnCap { child } => {
            NodeSnapshot::new("UnCap", "").with_children(vec![snapshot_from_node(child)])
        }
        Node::Opt { child } => {
            NodeSnapshot::new("Opt", "").with_children(vec![snapshot_from_node(child)])
        }
        Node::Iter { child, min, max } => {
            let mut snap = NodeSnapshot::new("Iter", "")
                .with_attribute("min", min)
                .with_children(vec![snapshot_from_node(child)]);
            if let Some(max) = max {
                snap = snap.with_attribute("max", max);
            }
            snap
        }
        Node::Prefer { child, preference } => NodeSnapshot::new("Prefer", "")
            .with_attribute("preference", preference)
            .with_children(vec![snapshot_from_node(child)]),
        Node::Group { child } => {
            NodeSnapshot::new("Group", "").with_children(vec![snapshot_from_node(child)])
        }
        Node::Seq { children } => NodeSnapshot::new("Seq", "")
            .with_children(children.iter().map(snapshot_from_node).collect()),
        Node::Alt { children } => NodeSnapshot::new("Alt", "")
            .with_children(children.iter().map(snapshot_from_node).collect()),
        Node::CharClassUnion { children, negative } => NodeSnapshot::new("CharClassUnion", "")
            .with_attribute("negative", negative)
            .with_children(children.iter().map(snapshot_from_node).collect()),
        Node::TemplateInstantiation { template, params } => {
            let mut snap = NodeSnapshot::new("TemplateInstantiation", template.clone());
            for (key, arg) in params {
                match arg {
                    TemplateArg::Literal(value) => {
                        snap.attributes.insert(key.clone(), value.clone());
                    }
                    TemplateArg::Node(node) => {
                        let mut child = snapshot_from_node(node);
                        child.attributes.insert("param".to_string(), key.clone());
                        snap.children.push(child);
                    }
                }
            }
            snap
        }
        Node::Comment { value } => NodeSnapshot::new("Comment", value.clone()),
        Node::MultiLineComment { lines } => {
            NodeSnapshot::new("MultiLineComment", lines.join("\n"))
        }
        Node::Spacer { count } => NodeSnapshot::new("Spacer", "").with_attribute("count", count),
    }
}

/// Snapshot a whole grammar: one child per non-empty section.
pub fn snapshot_from_grammar(grammar: &Grammar) -> NodeSnapshot {
    let mut root = NodeSnapshot::new("Grammar", grammar.meta.id.clone());
    for section in grammar.sections() {
        if section.is_empty() {
            continue;
        }
        let snap = NodeSnapshot::new("Section", section.kind().key())
            .with_children(section.iter().map(snapshot_from_node).collect());
        root.children.push(snap);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::grammar::{GrammarMeta, SectionKind};

    #[test]
    fn test_snapshot_shape() {
        let node = Node::name("rule", Node::seq(vec![Node::lit("a"), Node::reference("b")]));
        let snap = snapshot_from_node(&node);
        assert_eq!(snap.node_type, "Name");
        assert_eq!(snap.label, "rule");
        assert_eq!(snap.children.len(), 1);
        assert_eq!(snap.children[0].node_type, "Seq");
        assert_eq!(snap.children[0].children.len(), 2);
    }

    #[test]
    fn test_snapshot_serde_round_trip() {
        let node = Node::union(
            vec![Node::char_range('a', 'f', false), Node::reference("digit")],
            true,
        );
        let snap = snapshot_from_node(&node);
        let json = serde_json::to_string(&snap).unwrap();
        let back: NodeSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }

    #[test]
    fn test_grammar_snapshot_skips_empty_sections() {
        let mut g = Grammar::new(GrammarMeta {
            id: "g".to_string(),
            title: "g".to_string(),
            ..GrammarMeta::default()
        });
        g.section_mut(SectionKind::Prods)
            .push(Node::name("a", Node::lit("a")));
        let snap = snapshot_from_grammar(&g);
        assert_eq!(snap.children.len(), 1);
        assert_eq!(snap.children[0].label, "prods");
    }
}
