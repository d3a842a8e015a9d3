//! Grammar aggregate
//!
//! A [`Grammar`] owns five sections (characters, keywords, tokens,
//! fragmented, productions), each an ordered list of `Name` bindings.
//! Sections are addressable both by [`SectionKind`] and by layer ordinal:
//! section ordinals are layer ordinals, and a compile-time assertion pins
//! the two sequences together so the arithmetic can never drift.
//!
//! Bound names are globally unique across all five sections. That invariant
//! is not a local construction check: [`Grammar::validate`] runs a full-tree
//! name-collection pass (see `rewrite::collect_bound_names`) and reports the
//! first collision.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::layer::NodeLayer;
use super::node::{Node, NodeKind};
use super::rewrite;

/// Identifies one of the five grammar sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKind {
    Chars,
    Keywords,
    Tokens,
    Fragmented,
    Prods,
}

impl SectionKind {
    /// All sections, in layer order.
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Chars,
        SectionKind::Keywords,
        SectionKind::Tokens,
        SectionKind::Fragmented,
        SectionKind::Prods,
    ];

    /// The layer whose nodes this section holds.
    pub const fn layer(self) -> NodeLayer {
        match self {
            SectionKind::Chars => NodeLayer::CharClass,
            SectionKind::Keywords => NodeLayer::Keyword,
            SectionKind::Tokens => NodeLayer::Token,
            SectionKind::Fragmented => NodeLayer::Fragment,
            SectionKind::Prods => NodeLayer::Production,
        }
    }

    /// The section for a given layer, if the layer has one.
    pub fn for_layer(layer: NodeLayer) -> Option<SectionKind> {
        SectionKind::ALL.iter().copied().find(|k| k.layer() == layer)
    }

    /// Short key used in grammar files and bucket names.
    pub fn key(self) -> &'static str {
        match self {
            SectionKind::Chars => "chars",
            SectionKind::Keywords => "keywords",
            SectionKind::Tokens => "tokens",
            SectionKind::Fragmented => "fragmented",
            SectionKind::Prods => "prods",
        }
    }

    /// Human-readable name used for section banner comments.
    pub fn friendly_name(self) -> &'static str {
        match self {
            SectionKind::Chars => "characters",
            SectionKind::Keywords => "keywords",
            SectionKind::Tokens => "tokens",
            SectionKind::Fragmented => "fragmented",
            SectionKind::Prods => "productions",
        }
    }
}

// Section ordinals are layer ordinals. `Grammar::section_for_layer` indexes
// by `layer - first_layer`, which only works if the sequence is contiguous
// and starts at CharClass.
const _: () = {
    assert!(SectionKind::ALL[0].layer().ordinal() == 1);
    assert!(SectionKind::ALL[1].layer().ordinal() == 2);
    assert!(SectionKind::ALL[2].layer().ordinal() == 3);
    assert!(SectionKind::ALL[3].layer().ordinal() == 4);
    assert!(SectionKind::ALL[4].layer().ordinal() == 5);
};

/// One grammar section: an ordered list of `Name` bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    kind: SectionKind,
    children: Vec<Node>,
}

impl Section {
    pub fn new(kind: SectionKind) -> Self {
        Section {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_rules(kind: SectionKind, children: Vec<Node>) -> Self {
        Section { kind, children }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append a rule binding.
    pub fn push(&mut self, rule: Node) {
        self.children.push(rule);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.children.iter()
    }

    /// Concatenate another section's rules onto this one.
    pub fn embed(&mut self, other: Section) {
        self.children.extend(other.children);
    }

    /// The bound subtree for `name`, if this section binds it.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.children.iter().find_map(|rule| match rule {
            Node::Name { name: n, child } | Node::Cap { name: n, child } if n == name => {
                Some(child.as_ref())
            }
            _ => None,
        })
    }

    /// The first rule binding in the section.
    pub fn find_first_rule(&self) -> Option<(&str, &Node)> {
        self.children.iter().find_map(|rule| match rule {
            Node::Name { name, child } => Some((name.as_str(), child.as_ref())),
            _ => None,
        })
    }
}

/// Grammar metadata: identity, provenance and documentation. This is part
/// of the wire surface the grammar-file decoder produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrammarMeta {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub doc_ref: Vec<String>,
    /// Pattern matching the file names this grammar applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename_regexp: Option<String>,
}

/// Sample inputs attached to a grammar. Opaque to the core: downstream
/// tooling consumes it, and its absence is never an error here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestingSpec {
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Error raised by grammar-level validation.
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarError {
    /// Two rules bind the same name, anywhere across the five sections.
    DuplicateName { name: String },
    /// A section child that is not a `Name` binding.
    NotARule {
        section: SectionKind,
        found: NodeKind,
    },
    /// `meta.filename_regexp` does not compile.
    InvalidFilenamePattern { pattern: String, error: String },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::DuplicateName { name } => {
                write!(f, "duplicate rule name '{}'", name)
            }
            GrammarError::NotARule { section, found } => {
                write!(
                    f,
                    "section '{}' contains a {} where a Name binding was expected",
                    section.key(),
                    found
                )
            }
            GrammarError::InvalidFilenamePattern { pattern, error } => {
                write!(f, "invalid filename pattern '{}': {}", pattern, error)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

/// The aggregate root: metadata, optional test samples and the five
/// sections. Renders take their own deep copy (`Clone`); the engine never
/// shares one grammar between concurrent renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    pub meta: GrammarMeta,
    pub tests: Option<TestingSpec>,
    sections: [Section; 5],
}

impl Grammar {
    pub fn new(meta: GrammarMeta) -> Self {
        Grammar {
            meta,
            tests: None,
            sections: SectionKind::ALL.map(Section::new),
        }
    }

    pub fn section(&self, kind: SectionKind) -> &Section {
        &self.sections[kind as usize]
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        &mut self.sections[kind as usize]
    }

    /// The section holding nodes of the given layer, if any. Uses the layer
    /// ordinal directly as a section index (see the assertion above).
    pub fn section_for_layer(&self, layer: NodeLayer) -> Option<&Section> {
        let first = SectionKind::ALL[0].layer().ordinal();
        let idx = layer.ordinal().checked_sub(first)? as usize;
        self.sections.get(idx)
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Splice an auxiliary fragment in: matching sections are concatenated
    /// element-wise. Used by template expansion and sub-grammar imports.
    pub fn embed(&mut self, fragment: Fragment) {
        for (own, extra) in self.sections.iter_mut().zip(fragment.sections) {
            own.embed(extra);
        }
    }

    /// Where `name` is bound, searching all five sections.
    pub fn find_rule(&self, name: &str) -> Option<(SectionKind, &Node)> {
        self.sections
            .iter()
            .find_map(|s| s.find(name).map(|n| (s.kind(), n)))
    }

    /// Enforce the structural invariants that span the whole tree: section
    /// children are rule bindings, and every bound name is globally unique.
    pub fn validate(&self) -> Result<(), GrammarError> {
        for section in &self.sections {
            for child in section.children() {
                if !matches!(child, Node::Name { .. }) {
                    return Err(GrammarError::NotARule {
                        section: section.kind(),
                        found: child.kind(),
                    });
                }
            }
        }
        let mut seen = std::collections::BTreeSet::new();
        for bound in rewrite::collect_bound_names(self) {
            if !seen.insert(bound.name.clone()) {
                return Err(GrammarError::DuplicateName { name: bound.name });
            }
        }
        Ok(())
    }

    /// Whether `filename` matches the grammar's declared filename pattern.
    /// `false` when no pattern is declared.
    pub fn matches_filename(&self, filename: &str) -> Result<bool, GrammarError> {
        let Some(pattern) = &self.meta.filename_regexp else {
            return Ok(false);
        };
        let re = Regex::new(pattern).map_err(|e| GrammarError::InvalidFilenamePattern {
            pattern: pattern.clone(),
            error: e.to_string(),
        })?;
        Ok(re.is_match(filename))
    }
}

/// An auxiliary bundle of rules, produced by template expansion or
/// sub-grammar imports and destined for [`Grammar::embed`]. Same five
/// sections as a grammar, no metadata of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    sections: [Section; 5],
}

impl Fragment {
    pub fn new() -> Self {
        Fragment {
            sections: SectionKind::ALL.map(Section::new),
        }
    }

    pub fn section(&self, kind: SectionKind) -> &Section {
        &self.sections[kind as usize]
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        &mut self.sections[kind as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.is_empty())
    }

    /// Concatenate another fragment's sections onto this one.
    pub fn embed(&mut self, other: Fragment) {
        for (own, extra) in self.sections.iter_mut().zip(other.sections) {
            own.embed(extra);
        }
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Fragment::new()
    }
}
