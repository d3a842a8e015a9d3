//! Backend registry for backend discovery and selection
//!
//! A centralized registry of the available target DSLs. Backends are
//! registered once and retrieved by name; callers that just want "render
//! this grammar for tool X" go through [`BackendRegistry::transpile`].

use std::collections::HashMap;

use crate::ast::grammar::Grammar;
use crate::backend::{Backend, RenderError};
use crate::generator::{transpile, TranspiledResult};

/// Registry of grammar backends.
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn Backend>>,
}

impl BackendRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        BackendRegistry {
            backends: HashMap::new(),
        }
    }

    /// Register a backend.
    ///
    /// If a backend with the same name already exists, it will be replaced.
    pub fn register<B: Backend + 'static>(&mut self, backend: B) {
        self.backends
            .insert(backend.name().to_string(), Box::new(backend));
    }

    /// Get a backend by name.
    pub fn get(&self, name: &str) -> Result<&dyn Backend, RenderError> {
        self.backends
            .get(name)
            .map(|b| b.as_ref())
            .ok_or_else(|| RenderError::BackendNotFound {
                name: name.to_string(),
            })
    }

    /// Check if a backend exists.
    pub fn has(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// List all available backend names (sorted).
    pub fn list_backends(&self) -> Vec<String> {
        let mut names: Vec<_> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Render a grammar with the named backend. The grammar must already be
    /// template-expanded; callers rendering for several backends hand each
    /// call its own copy.
    pub fn transpile(&self, grammar: &Grammar, backend: &str) -> Result<TranspiledResult, RenderError> {
        let backend = self.get(backend)?;
        transpile(backend, grammar)
    }

    /// Create a registry with the bundled backends.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(crate::backends::antlr::AntlrBackend);
        registry.register(crate::backends::waxeye::WaxeyeBackend);
        registry.register(crate::backends::pest::PestBackend);
        registry.register(crate::backends::lark::LarkBackend);
        registry.register(crate::backends::parglare::ParglareBackend);

        registry
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::grammar::{GrammarMeta, SectionKind};
    use crate::ast::node::Node;

    #[derive(Debug)]
    struct TestBackend;
    impl Backend for TestBackend {
        fn name(&self) -> &str {
            "test"
        }
        fn description(&self) -> &str {
            "Test backend"
        }
        fn grammar_extension(&self) -> &str {
            "t"
        }
        fn assignment_operator(&self) -> &str {
            " = "
        }
        fn single_line_comment_start(&self) -> &str {
            "# "
        }
    }

    fn grammar() -> Grammar {
        let mut g = Grammar::new(GrammarMeta {
            id: "g".to_string(),
            title: "g".to_string(),
            ..GrammarMeta::default()
        });
        g.section_mut(SectionKind::Prods)
            .push(Node::name("a", Node::lit("a")));
        g
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = BackendRegistry::new();
        registry.register(TestBackend);
        assert!(registry.has("test"));
        assert_eq!(registry.get("test").unwrap().name(), "test");
        assert_eq!(registry.list_backends(), vec!["test"]);
    }

    #[test]
    fn test_registry_get_nonexistent() {
        let registry = BackendRegistry::new();
        let err = registry.get("nonexistent").unwrap_err();
        assert_eq!(
            err,
            RenderError::BackendNotFound {
                name: "nonexistent".to_string()
            }
        );
    }

    #[test]
    fn test_registry_transpile() {
        let mut registry = BackendRegistry::new();
        registry.register(TestBackend);
        let result = registry.transpile(&grammar(), "test").unwrap();
        assert_eq!(result.id, "g");
        assert!(result.text.contains("a = \"a\""));
    }

    #[test]
    fn test_registry_transpile_not_found() {
        let registry = BackendRegistry::new();
        let err = registry.transpile(&grammar(), "nonexistent").unwrap_err();
        assert!(matches!(err, RenderError::BackendNotFound { .. }));
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = BackendRegistry::with_defaults();
        assert!(registry.has("antlr"));
        assert!(registry.has("waxeye"));
        assert!(registry.has("pest"));
        assert!(registry.has("lark"));
        assert!(registry.has("parglare"));
    }

    #[test]
    fn test_registry_replace_backend() {
        let mut registry = BackendRegistry::new();
        registry.register(TestBackend);
        registry.register(TestBackend); // Replace
        assert_eq!(registry.list_backends().len(), 1);
    }
}
