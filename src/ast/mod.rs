//! The grammar intermediate representation
//!
//! Everything the engine manipulates lives here: the closed [`Node`] sum
//! type, the [`Grammar`] aggregate with its five layered sections, the
//! generic tree-rewrite primitive, and the normalized snapshot view.
//!
//! - [`layer`]: the layer ordering that classifies constructs and indexes
//!   sections
//! - [`node`]: the IR node variants and their checked constructors
//! - [`grammar`]: sections, metadata and the aggregate root
//! - [`rewrite`]: the traversal/replace/delete primitive and its derived
//!   utilities
//! - [`snapshot`]: serde-friendly normalized tree for downstream consumers

pub mod grammar;
pub mod layer;
pub mod node;
pub mod rewrite;
pub mod snapshot;

pub use grammar::{Fragment, Grammar, GrammarError, GrammarMeta, Section, SectionKind, TestingSpec};
pub use layer::NodeLayer;
pub use node::{Node, NodeError, NodeKind, Preference, TemplateArg};
pub use rewrite::{
    collect_bound_names, collect_referenced, rewrite_references, rewrite_references_map, walk,
    BoundName, ParentInfo, Visit, VisitAction, WalkOutcome,
};
pub use snapshot::{snapshot_from_grammar, snapshot_from_node, NodeSnapshot};
