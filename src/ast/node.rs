//! Grammar IR nodes
//!
//! One closed sum type covers every construct a grammar tree can contain.
//! Backends dispatch over it with exhaustive `match`es, so a construct a
//! backend forgot to consider is a compile error, not a runtime surprise.
//!
//! Shapes:
//! - leaves: `Ref`, `Lit`, `CharClass`, `CharRange`, `WellKnown`
//! - wrappers (one child): `Name`, `Cap`, `UnCap`, `Opt`, `Iter`, `Prefer`,
//!   `Group`
//! - collections (ordered children): `Seq`, `Alt`, `CharClassUnion`
//! - placeholders: `TemplateInstantiation` (consumed by template expansion,
//!   forbidden past it)
//! - cosmetic: `Comment`, `MultiLineComment`, `Spacer`
//!
//! Constructors with non-trivial invariants (`iter`, `prefer`) are fallible;
//! everything else is plain struct syntax or a thin convenience function.

use std::collections::BTreeMap;
use std::fmt;

use super::grammar::Grammar;
use super::layer::NodeLayer;

/// An LR/LL conflict-resolution hint carried by [`Node::Prefer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    Shift,
    Reduce,
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preference::Shift => write!(f, "shift"),
            Preference::Reduce => write!(f, "reduce"),
        }
    }
}

/// An argument supplied to a template instantiation: either a grammar
/// subtree or an opaque literal.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateArg {
    Node(Node),
    Literal(String),
}

/// A node of the grammar IR tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A by-name link to another rule, resolved lazily against the owning
    /// grammar.
    Ref { name: String },
    /// A literal string, usually a keyword.
    Lit { value: String },
    /// An explicit set of single characters.
    CharClass { chars: String, negative: bool },
    /// An inclusive code-point interval.
    CharRange { first: u32, last: u32, negative: bool },
    /// A named reference into the built-in character-class table.
    WellKnown { name: String, negative: bool },
    /// Binds an identifier to a subtree (a rule).
    Name { name: String, child: Box<Node> },
    /// A named capture: the sub-match is promoted into the parse result.
    Cap { name: String, child: Box<Node> },
    /// Excludes a sub-match from the parse result.
    UnCap { child: Box<Node> },
    /// Zero or one.
    Opt { child: Box<Node> },
    /// `min` to `max` repetitions, `max` absent meaning unbounded.
    /// Construct through [`Node::iter`], which checks the bounds.
    Iter {
        child: Box<Node>,
        min: u32,
        max: Option<u32>,
    },
    /// A conflict-resolution hint. Construct through [`Node::prefer`],
    /// which checks the child kind.
    Prefer {
        child: Box<Node>,
        preference: Preference,
    },
    /// Forces explicit grouping in the rendered DSL. Synthetic: inserted by
    /// the generator's auto-grouping, never authored directly.
    Group { child: Box<Node> },
    /// Concatenation.
    Seq { children: Vec<Node> },
    /// Ordered alternation.
    Alt { children: Vec<Node> },
    /// Union of character-set nodes; itself a character-set node. An empty
    /// union is meaningful (the empty set).
    CharClassUnion { children: Vec<Node>, negative: bool },
    /// A template invocation awaiting expansion. Must not survive into the
    /// generator stage.
    TemplateInstantiation {
        template: String,
        params: BTreeMap<String, TemplateArg>,
    },
    /// A single-line comment.
    Comment { value: String },
    /// A multi-line comment.
    MultiLineComment { lines: Vec<String> },
    /// `count` line breaks worth of vertical space.
    Spacer { count: u32 },
}

/// Field-free discriminant of a [`Node`], used by the grouping rules and as
/// a compact description in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Ref,
    Lit,
    CharClass,
    CharRange,
    WellKnown,
    Name,
    Cap,
    UnCap,
    Opt,
    Iter,
    Prefer,
    Group,
    Seq,
    Alt,
    CharClassUnion,
    TemplateInstantiation,
    Comment,
    MultiLineComment,
    Spacer,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error raised by the checked node constructors.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeError {
    /// `Iter` with `min=0, max=1`; `Opt` is the way to spell that.
    UseOptForZeroOrOne,
    /// `Iter` bounds with `max <= min`.
    InvalidIterBounds { min: u32, max: u32 },
    /// `Prefer` wrapping something other than `Seq`, `Iter` or `Opt`.
    InvalidPreferChild { found: NodeKind },
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::UseOptForZeroOrOne => {
                write!(f, "Iter with min=0, max=1 must be spelled as Opt")
            }
            NodeError::InvalidIterBounds { min, max } => {
                write!(f, "Iter bounds invalid: min={} must be < max={}", min, max)
            }
            NodeError::InvalidPreferChild { found } => {
                write!(
                    f,
                    "Prefer may only wrap Seq, Iter or Opt, found {}",
                    found
                )
            }
        }
    }
}

impl std::error::Error for NodeError {}

impl Node {
    /// Checked `Iter` constructor: `min < max` whenever `max` is present,
    /// and the zero-or-one shape is rejected in favour of `Opt`.
    pub fn iter(child: Node, min: u32, max: Option<u32>) -> Result<Node, NodeError> {
        if let Some(max) = max {
            if min == 0 && max == 1 {
                return Err(NodeError::UseOptForZeroOrOne);
            }
            if min >= max {
                return Err(NodeError::InvalidIterBounds { min, max });
            }
        }
        Ok(Node::Iter {
            child: Box::new(child),
            min,
            max,
        })
    }

    /// Checked `Prefer` constructor: the hint is only legal on `Seq`,
    /// `Iter` and `Opt` subtrees.
    pub fn prefer(child: Node, preference: Preference) -> Result<Node, NodeError> {
        match child.kind() {
            NodeKind::Seq | NodeKind::Iter | NodeKind::Opt => Ok(Node::Prefer {
                child: Box::new(child),
                preference,
            }),
            found => Err(NodeError::InvalidPreferChild { found }),
        }
    }

    /// An inclusive character range.
    pub fn char_range(first: char, last: char, negative: bool) -> Node {
        Node::CharRange {
            first: first as u32,
            last: last as u32,
            negative,
        }
    }

    pub fn reference(name: impl Into<String>) -> Node {
        Node::Ref { name: name.into() }
    }

    pub fn lit(value: impl Into<String>) -> Node {
        Node::Lit {
            value: value.into(),
        }
    }

    pub fn name(name: impl Into<String>, child: Node) -> Node {
        Node::Name {
            name: name.into(),
            child: Box::new(child),
        }
    }

    pub fn cap(name: impl Into<String>, child: Node) -> Node {
        Node::Cap {
            name: name.into(),
            child: Box::new(child),
        }
    }

    pub fn uncap(child: Node) -> Node {
        Node::UnCap {
            child: Box::new(child),
        }
    }

    pub fn opt(child: Node) -> Node {
        Node::Opt {
            child: Box::new(child),
        }
    }

    pub fn seq(children: Vec<Node>) -> Node {
        Node::Seq { children }
    }

    pub fn alt(children: Vec<Node>) -> Node {
        Node::Alt { children }
    }

    pub fn char_class(chars: impl Into<String>, negative: bool) -> Node {
        Node::CharClass {
            chars: chars.into(),
            negative,
        }
    }

    pub fn union(children: Vec<Node>, negative: bool) -> Node {
        Node::CharClassUnion { children, negative }
    }

    pub fn well_known(name: impl Into<String>, negative: bool) -> Node {
        Node::WellKnown {
            name: name.into(),
            negative,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Ref { .. } => NodeKind::Ref,
            Node::Lit { .. } => NodeKind::Lit,
            Node::CharClass { .. } => NodeKind::CharClass,
            Node::CharRange { .. } => NodeKind::CharRange,
            Node::WellKnown { .. } => NodeKind::WellKnown,
            Node::Name { .. } => NodeKind::Name,
            Node::Cap { .. } => NodeKind::Cap,
            Node::UnCap { .. } => NodeKind::UnCap,
            Node::Opt { .. } => NodeKind::Opt,
            Node::Iter { .. } => NodeKind::Iter,
            Node::Prefer { .. } => NodeKind::Prefer,
            Node::Group { .. } => NodeKind::Group,
            Node::Seq { .. } => NodeKind::Seq,
            Node::Alt { .. } => NodeKind::Alt,
            Node::CharClassUnion { .. } => NodeKind::CharClassUnion,
            Node::TemplateInstantiation { .. } => NodeKind::TemplateInstantiation,
            Node::Comment { .. } => NodeKind::Comment,
            Node::MultiLineComment { .. } => NodeKind::MultiLineComment,
            Node::Spacer { .. } => NodeKind::Spacer,
        }
    }

    /// Whether the node is excluded from the ancestor stack the grouping
    /// algorithm consults.
    pub fn stack_invisible(&self) -> bool {
        matches!(self, Node::Group { .. } | Node::UnCap { .. })
    }

    /// Whether the node is skipped when computing the first meaningful
    /// descendant for downstream schema purposes.
    pub fn ast_invisible(&self) -> bool {
        matches!(
            self,
            Node::Group { .. } | Node::UnCap { .. } | Node::Prefer { .. }
        )
    }

    /// The wrapped child, for wrapper-shaped nodes.
    pub fn wrapped_child(&self) -> Option<&Node> {
        match self {
            Node::Name { child, .. }
            | Node::Cap { child, .. }
            | Node::UnCap { child }
            | Node::Opt { child }
            | Node::Iter { child, .. }
            | Node::Prefer { child, .. }
            | Node::Group { child } => Some(child),
            _ => None,
        }
    }

    /// The ordered children, for collection-shaped nodes.
    pub fn collection_children(&self) -> Option<&[Node]> {
        match self {
            Node::Seq { children }
            | Node::Alt { children }
            | Node::CharClassUnion { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Whether an emptied collection stays meaningful instead of collapsing
    /// away during rewriting.
    pub fn empty_makes_sense(&self) -> bool {
        matches!(self, Node::CharClassUnion { .. })
    }

    /// The first descendant that is not an AST-invisible wrapper.
    pub fn ast_visible_child(&self) -> &Node {
        let mut node = self;
        while node.ast_invisible() {
            match node.wrapped_child() {
                Some(child) => node = child,
                None => break,
            }
        }
        node
    }

    /// The declared lower bound of the node's layer.
    fn layer_bound(&self) -> NodeLayer {
        match self {
            Node::Ref { .. } => NodeLayer::Any,
            // A one-character literal is character-class material, a longer
            // one is a keyword.
            Node::Lit { value } => {
                if value.chars().count() > 1 {
                    NodeLayer::Keyword
                } else {
                    NodeLayer::CharClass
                }
            }
            Node::CharClass { .. }
            | Node::CharRange { .. }
            | Node::WellKnown { .. }
            | Node::CharClassUnion { .. } => NodeLayer::CharClass,
            Node::Name { .. } => NodeLayer::Grammar,
            Node::Cap { .. } | Node::UnCap { .. } => NodeLayer::Production,
            Node::Opt { .. } | Node::Iter { .. } | Node::Seq { .. } | Node::Alt { .. } => {
                NodeLayer::Token
            }
            Node::Prefer { .. } => NodeLayer::Fragment,
            Node::Group { .. } | Node::TemplateInstantiation { .. } => NodeLayer::Any,
            Node::Comment { .. } | Node::MultiLineComment { .. } | Node::Spacer { .. } => {
                NodeLayer::Any
            }
        }
    }

    /// The effective layer: the max of the node's own bound and its
    /// children's effective layers. A `Ref` takes the layer of the section
    /// that binds the referenced name, when a grammar is supplied.
    pub fn layer(&self, grammar: Option<&Grammar>) -> NodeLayer {
        let bound = self.layer_bound();
        if let Node::Ref { name } = self {
            if let Some(grammar) = grammar {
                if let Some((section, _)) = grammar.find_rule(name) {
                    return section.layer();
                }
            }
            return bound;
        }
        let from_children = if let Some(children) = self.collection_children() {
            children
                .iter()
                .map(|c| c.layer(grammar))
                .max()
                .unwrap_or(NodeLayer::Any)
        } else if let Some(child) = self.wrapped_child() {
            child.layer(grammar)
        } else {
            NodeLayer::Any
        };
        bound.max(from_children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter_rejects_zero_or_one() {
        let err = Node::iter(Node::reference("x"), 0, Some(1)).unwrap_err();
        assert_eq!(err, NodeError::UseOptForZeroOrOne);
    }

    #[test]
    fn test_iter_rejects_inverted_bounds() {
        let err = Node::iter(Node::reference("x"), 2, Some(1)).unwrap_err();
        assert_eq!(err, NodeError::InvalidIterBounds { min: 2, max: 1 });
        let err = Node::iter(Node::reference("x"), 2, Some(2)).unwrap_err();
        assert_eq!(err, NodeError::InvalidIterBounds { min: 2, max: 2 });
    }

    #[test]
    fn test_iter_accepts_unbounded() {
        assert!(Node::iter(Node::reference("x"), 0, None).is_ok());
        assert!(Node::iter(Node::reference("x"), 3, None).is_ok());
        assert!(Node::iter(Node::reference("x"), 1, Some(3)).is_ok());
    }

    #[test]
    fn test_prefer_child_kinds() {
        let seq = Node::seq(vec![Node::reference("a")]);
        assert!(Node::prefer(seq, Preference::Shift).is_ok());
        let err = Node::prefer(Node::lit("a"), Preference::Reduce).unwrap_err();
        assert_eq!(err, NodeError::InvalidPreferChild { found: NodeKind::Lit });
    }

    #[test]
    fn test_lit_layer_depends_on_length() {
        assert_eq!(Node::lit("a").layer(None), NodeLayer::CharClass);
        assert_eq!(Node::lit("if").layer(None), NodeLayer::Keyword);
    }

    #[test]
    fn test_effective_layer_bubbles_up() {
        // A sequence of keywords classifies at token layer (its own bound).
        let seq = Node::seq(vec![Node::lit("if"), Node::lit("then")]);
        assert_eq!(seq.layer(None), NodeLayer::Token);
        // A capture raises the whole subtree to production layer.
        let cap = Node::cap("k", Node::lit("if"));
        assert_eq!(cap.layer(None), NodeLayer::Production);
        let seq = Node::seq(vec![Node::cap("k", Node::lit("if"))]);
        assert_eq!(seq.layer(None), NodeLayer::Production);
    }

    #[test]
    fn test_ast_visible_child_skips_invisible_wrappers() {
        let inner = Node::lit("x");
        let wrapped = Node::Group {
            child: Box::new(Node::uncap(inner.clone())),
        };
        assert_eq!(wrapped.ast_visible_child(), &inner);
    }

    #[test]
    fn test_stack_visibility() {
        assert!(Node::Group {
            child: Box::new(Node::lit("x"))
        }
        .stack_invisible());
        assert!(Node::uncap(Node::lit("x")).stack_invisible());
        assert!(!Node::opt(Node::lit("x")).stack_invisible());
    }
}
