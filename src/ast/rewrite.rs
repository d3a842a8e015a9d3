//! Tree-rewrite engine
//!
//! One generic traversal primitive, [`walk`], covers every structural
//! rewrite in the engine: template expansion, reference renaming, name
//! collection. A visitor inspects each node and answers three questions:
//! descend into the children? replace the node (or delete it)? re-walk the
//! replacement? Deletion propagates structurally: a wrapper whose child is
//! deleted is deleted with it, and a collection that empties out collapses
//! away unless the empty form is meaningful (`CharClassUnion`).
//!
//! The visitor sees each node together with a [`ParentInfo`] describing its
//! direct parent: the parent's kind, plus the bound name when the parent is
//! a `Name` or `Cap`. Those are the two parent facts rewrite callbacks
//! actually consult (shape checks, and deriving rule-local names), and
//! passing them by value sidesteps aliasing the parent while its children
//! are being rebuilt.

use std::collections::{BTreeMap, BTreeSet};

use super::grammar::{Grammar, SectionKind};
use super::node::{Node, NodeKind};

/// What to do with the visited node.
#[derive(Debug)]
pub enum VisitAction {
    /// Leave the node as it is.
    Keep,
    /// Substitute the node.
    Replace(Node),
    /// Delete the node, propagating structurally.
    Delete,
}

/// A visitor's answer for one node.
#[derive(Debug)]
pub struct Visit {
    /// Walk into the node's children afterwards?
    pub descend: bool,
    pub action: VisitAction,
    /// Walk the replacement again? Lets one callback idempotently reprocess
    /// what it just produced (nested template expansion). Requesting this
    /// together with `Delete` is a programming error: there is nothing to
    /// re-walk, the deletion wins.
    pub rewalk: bool,
}

impl Visit {
    /// Keep the node and descend. The common case.
    pub fn keep() -> Self {
        Visit {
            descend: true,
            action: VisitAction::Keep,
            rewalk: false,
        }
    }

    /// Keep the node, do not descend.
    pub fn skip() -> Self {
        Visit {
            descend: false,
            action: VisitAction::Keep,
            rewalk: false,
        }
    }

    /// Replace the node, without descending or re-walking.
    pub fn replace(node: Node) -> Self {
        Visit {
            descend: false,
            action: VisitAction::Replace(node),
            rewalk: false,
        }
    }

    /// Replace the node and walk the replacement again.
    pub fn replace_and_rewalk(node: Node) -> Self {
        Visit {
            descend: false,
            action: VisitAction::Replace(node),
            rewalk: true,
        }
    }

    /// Delete the node.
    pub fn delete() -> Self {
        Visit {
            descend: false,
            action: VisitAction::Delete,
            rewalk: false,
        }
    }
}

/// The facts a visitor learns about the visited node's direct parent.
#[derive(Debug, Clone, Copy)]
pub struct ParentInfo<'a> {
    pub kind: NodeKind,
    /// The bound name, when the parent is a `Name` or `Cap`.
    pub name: Option<&'a str>,
}

/// Whether the node survived the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Kept,
    Deleted,
}

/// Walk `node`, calling `visit` on it and (depending on the answers) its
/// descendants, applying replacements and deletions in place.
///
/// Returns [`WalkOutcome::Deleted`] when the node itself was deleted,
/// directly or structurally because its content went away. The caller owns
/// removing a deleted node from wherever it was stored; recursive calls do
/// exactly that for children.
pub fn walk<F>(node: &mut Node, parent: Option<&ParentInfo<'_>>, visit: &mut F) -> WalkOutcome
where
    F: FnMut(&Node, Option<&ParentInfo<'_>>) -> Visit,
{
    let answer = visit(node, parent);
    match answer.action {
        VisitAction::Delete => {
            // Nothing to re-walk once deleted; the deletion wins.
            debug_assert!(!answer.rewalk, "delete and rewalk requested together");
            return WalkOutcome::Deleted;
        }
        VisitAction::Replace(replacement) => {
            *node = replacement;
            if answer.rewalk {
                if walk(node, parent, visit) == WalkOutcome::Deleted {
                    return WalkOutcome::Deleted;
                }
            }
        }
        VisitAction::Keep => {}
    }
    if !answer.descend {
        return WalkOutcome::Kept;
    }
    descend(node, visit)
}

fn descend<F>(node: &mut Node, visit: &mut F) -> WalkOutcome
where
    F: FnMut(&Node, Option<&ParentInfo<'_>>) -> Visit,
{
    let kind = node.kind();
    match node {
        Node::Seq { children } | Node::Alt { children } => {
            let info = ParentInfo { kind, name: None };
            children.retain_mut(|c| walk(c, Some(&info), visit) == WalkOutcome::Kept);
            if children.is_empty() {
                return WalkOutcome::Deleted;
            }
        }
        Node::CharClassUnion { children, .. } => {
            // Empty is meaningful here: the union survives emptying out.
            let info = ParentInfo { kind, name: None };
            children.retain_mut(|c| walk(c, Some(&info), visit) == WalkOutcome::Kept);
        }
        Node::Name { name, child } | Node::Cap { name, child } => {
            let info = ParentInfo {
                kind,
                name: Some(name.as_str()),
            };
            if walk(child, Some(&info), visit) == WalkOutcome::Deleted {
                return WalkOutcome::Deleted;
            }
        }
        Node::UnCap { child }
        | Node::Opt { child }
        | Node::Iter { child, .. }
        | Node::Prefer { child, .. }
        | Node::Group { child } => {
            let info = ParentInfo { kind, name: None };
            if walk(child, Some(&info), visit) == WalkOutcome::Deleted {
                return WalkOutcome::Deleted;
            }
        }
        // Leaves and placeholders: nothing to descend into.
        Node::Ref { .. }
        | Node::Lit { .. }
        | Node::CharClass { .. }
        | Node::CharRange { .. }
        | Node::WellKnown { .. }
        | Node::TemplateInstantiation { .. }
        | Node::Comment { .. }
        | Node::MultiLineComment { .. }
        | Node::Spacer { .. } => {}
    }
    WalkOutcome::Kept
}

/// Read-only counterpart of [`walk`] for collectors: calls `visit` on every
/// node; a `false` answer prunes the subtree. The mutable primitive cannot
/// serve borrows of shared grammars, so the read path lives here once
/// instead of in each collector.
pub fn for_each_node<F>(node: &Node, parent: Option<&ParentInfo<'_>>, visit: &mut F)
where
    F: FnMut(&Node, Option<&ParentInfo<'_>>) -> bool,
{
    if !visit(node, parent) {
        return;
    }
    let kind = node.kind();
    match node {
        Node::Seq { children } | Node::Alt { children } | Node::CharClassUnion { children, .. } => {
            let info = ParentInfo { kind, name: None };
            for c in children {
                for_each_node(c, Some(&info), visit);
            }
        }
        Node::Name { name, child } | Node::Cap { name, child } => {
            let info = ParentInfo {
                kind,
                name: Some(name.as_str()),
            };
            for_each_node(child, Some(&info), visit);
        }
        Node::UnCap { child }
        | Node::Opt { child }
        | Node::Iter { child, .. }
        | Node::Prefer { child, .. }
        | Node::Group { child } => {
            let info = ParentInfo { kind, name: None };
            for_each_node(child, Some(&info), visit);
        }
        _ => {}
    }
}

/// Rewrite every `Ref` name through `remap`. `None` keeps the reference as
/// it is. Always descends everywhere, never deletes.
pub fn rewrite_references<F>(node: &mut Node, remap: &mut F)
where
    F: FnMut(&str) -> Option<String>,
{
    let outcome = walk(node, None, &mut |n, _| {
        if let Node::Ref { name } = n {
            if let Some(new_name) = remap(name) {
                let mut v = Visit::replace(Node::Ref { name: new_name });
                v.descend = true;
                return v;
            }
        }
        Visit::keep()
    });
    debug_assert_eq!(outcome, WalkOutcome::Kept);
}

/// Map-driven convenience over [`rewrite_references`].
pub fn rewrite_references_map(node: &mut Node, remap: &BTreeMap<String, String>) {
    rewrite_references(node, &mut |name| remap.get(name).cloned());
}

/// All names referenced anywhere under `node`.
pub fn collect_referenced(node: &Node) -> BTreeSet<String> {
    let mut referenced = BTreeSet::new();
    for_each_node(node, None, &mut |n, _| {
        if let Node::Ref { name } = n {
            referenced.insert(name.clone());
        }
        true
    });
    referenced
}

/// One name binding found by [`collect_bound_names`].
#[derive(Debug, Clone, PartialEq)]
pub struct BoundName {
    pub name: String,
    /// The section the binding lives in.
    pub section: SectionKind,
    /// The kind of the bound subtree.
    pub bound_kind: NodeKind,
}

/// Every name bound across the grammar's five sections, in section order.
/// Descent stops at each `Name`/`Cap`: bindings nested inside a rule body
/// belong to that rule, not to the grammar's namespace. Uniqueness is the
/// caller's invariant to enforce (see `Grammar::validate`).
pub fn collect_bound_names(grammar: &Grammar) -> Vec<BoundName> {
    let mut bound = Vec::new();
    for section in grammar.sections() {
        for child in section.children() {
            for_each_node(child, None, &mut |n, _| match n {
                Node::Name { name, child } | Node::Cap { name, child } => {
                    bound.push(BoundName {
                        name: name.clone(),
                        section: section.kind(),
                        bound_kind: child.kind(),
                    });
                    false
                }
                _ => true,
            });
        }
    }
    bound
}
