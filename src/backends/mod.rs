//! Bundled backends
//!
//! One module per target DSL, mirroring the framework contract: a backend
//! is a handful of string constants, an escaper choice, a character-class
//! strategy, and the occasional hook override. Anything algorithmic
//! belongs in the generator, not here.

pub mod antlr;
pub mod lark;
pub mod parglare;
pub mod pest;
pub mod waxeye;

pub use antlr::AntlrBackend;
pub use lark::LarkBackend;
pub use parglare::ParglareBackend;
pub use pest::PestBackend;
pub use waxeye::WaxeyeBackend;
