//! One grammar IR, many parser-generator DSLs
//!
//!     grambel holds a single unified intermediate representation of a
//!     formal grammar and renders it into the concrete surface syntax of
//!     different parser-generator tools. Lifters for the reverse direction
//!     (tool grammar -> IR) build on the same node model and rewrite
//!     engine.
//!
//! Architecture
//!
//!     - ast: the IR: a closed node sum type, the Grammar aggregate with
//!       its five layered sections, the generic tree-rewrite primitive and
//!       a normalized serde snapshot
//!     - charclass: character-set algebra (ranges, complement, the two
//!       rendering strategies, the well-known class table)
//!     - backend: the Backend trait every target DSL implements
//!     - registry: BackendRegistry for discovery and selection
//!     - generator: the rendering pass (exhaustive dispatch,
//!       auto-grouping, sectioned output)
//!     - templates: macro expansion run before any rendering
//!     - backends: the bundled targets (antlr, waxeye, pest, lark,
//!       parglare)
//!
//!     This is a pure lib: no I/O, no shell assumptions. The grammar-file
//!     decoder, tool runners and the CLI live elsewhere and talk to this
//!     crate through `Grammar` values and `TranspiledResult`s.
//!
//! Pipeline
//!
//!     A caller builds (or lifts) a `Grammar`, runs `expand_templates`
//!     over it once, then renders it per backend:
//!
//!     ```ignore
//!     let registry = BackendRegistry::with_defaults();
//!     expand_templates(&mut grammar, &TemplateRegistry::with_defaults())?;
//!     for name in registry.list_backends() {
//!         let copy = grammar.clone(); // one copy per render
//!         let result = registry.transpile(&copy, &name)?;
//!         println!("{}", result.text);
//!     }
//!     ```
//!
//!     Expansion and rendering both mutate per-render state in place, so
//!     each backend render takes its own grammar copy; the engine never
//!     shares one grammar across renders.

pub mod ast;
pub mod backend;
pub mod backends;
pub mod charclass;
pub mod generator;
pub mod registry;
pub mod templates;

pub use ast::{Grammar, GrammarError, GrammarMeta, Node, NodeError, NodeKind, SectionKind};
pub use backend::{Backend, RenderError, SectionId};
pub use charclass::{CharClassStrategy, CharSetError, KeepStyle, MergeStyle};
pub use generator::{transpile, TranspiledResult};
pub use registry::BackendRegistry;
pub use templates::{expand_templates, Template, TemplateError, TemplateRegistry};
