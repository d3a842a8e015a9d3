//! Template / macro expansion
//!
//! A template is a named, parameterized IR-to-IR expansion: instantiating
//! one replaces the `TemplateInstantiation` placeholder with a plain
//! subtree and splices an auxiliary fragment of new rules into the
//! grammar. Expansion runs once, before any backend rendering, over the
//! tree-rewrite engine; nothing template-shaped survives into the
//! generator.
//!
//! Parameters are declared as an explicit ordered schema
//! ([`ParamSpec`]) and supplied arguments are checked against it at
//! expansion: missing, unknown and wrongly-kinded arguments all fail
//! before the template runs.
//!
//! Fragment rule names derive deterministically from the template id and
//! the target production's name, so repeated instantiations in different
//! rules cannot collide.

pub mod delimited;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::ast::grammar::{Fragment, Grammar, SectionKind};
use crate::ast::node::{Node, NodeKind, TemplateArg};
use crate::ast::rewrite::{walk, Visit};

pub use delimited::Delimited;

/// What a template parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// An IR subtree.
    Node,
    /// An opaque literal string.
    Literal,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Node => write!(f, "node"),
            ParamKind::Literal => write!(f, "literal"),
        }
    }
}

/// One declared template parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

/// The two things an expansion produces: the subtree that replaces the
/// instantiation, and the auxiliary rules to splice into the grammar.
#[derive(Debug)]
pub struct Expansion {
    pub replacement: Node,
    pub fragment: Fragment,
}

/// Error raised during template expansion.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    UnknownTemplate { id: String },
    MissingParam { template: String, param: String },
    UnknownParam { template: String, param: String },
    WrongParamKind {
        template: String,
        param: String,
        expected: ParamKind,
    },
    /// The instantiation is not the direct child of a rule binding, so no
    /// target name exists to derive fragment-rule names from.
    BadParent {
        template: String,
        found: Option<NodeKind>,
    },
    /// The target rule name does not yield a usable derived name.
    NameDerivation { rule: String, reason: String },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UnknownTemplate { id } => write!(f, "unknown template '{}'", id),
            TemplateError::MissingParam { template, param } => {
                write!(f, "template '{}' requires parameter '{}'", template, param)
            }
            TemplateError::UnknownParam { template, param } => {
                write!(
                    f,
                    "template '{}' does not declare parameter '{}'",
                    template, param
                )
            }
            TemplateError::WrongParamKind {
                template,
                param,
                expected,
            } => write!(
                f,
                "template '{}' parameter '{}' must be a {}",
                template, param, expected
            ),
            TemplateError::BadParent { template, found } => match found {
                Some(kind) => write!(
                    f,
                    "template '{}' must be instantiated directly under a rule binding, found {}",
                    template, kind
                ),
                None => write!(
                    f,
                    "template '{}' must be instantiated directly under a rule binding",
                    template
                ),
            },
            TemplateError::NameDerivation { rule, reason } => {
                write!(f, "cannot derive names from rule '{}': {}", rule, reason)
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// A registered template.
pub trait Template: Send + Sync {
    /// The unique id instantiations reference.
    fn id(&self) -> &str;

    /// The ordered parameter schema.
    fn params_schema(&self) -> &[ParamSpec];

    /// Expand one instantiation found directly under the rule named
    /// `rule_name`, with `params` already validated against the schema.
    fn expand(
        &self,
        grammar: &Grammar,
        rule_name: &str,
        params: &BTreeMap<String, TemplateArg>,
    ) -> Result<Expansion, TemplateError>;
}

/// Registry of templates, by id.
pub struct TemplateRegistry {
    templates: HashMap<String, Box<dyn Template>>,
}

impl TemplateRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        TemplateRegistry {
            templates: HashMap::new(),
        }
    }

    /// Register a template. The schema is fixed at registration; duplicate
    /// parameter names are a defect in the template itself.
    pub fn register<T: Template + 'static>(&mut self, template: T) {
        debug_assert!(
            {
                let mut names: Vec<_> =
                    template.params_schema().iter().map(|p| p.name).collect();
                names.sort_unstable();
                names.windows(2).all(|w| w[0] != w[1])
            },
            "template schema declares a duplicate parameter"
        );
        self.templates
            .insert(template.id().to_string(), Box::new(template));
    }

    pub fn get(&self, id: &str) -> Result<&dyn Template, TemplateError> {
        self.templates
            .get(id)
            .map(|t| t.as_ref())
            .ok_or_else(|| TemplateError::UnknownTemplate { id: id.to_string() })
    }

    pub fn has(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn list_templates(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.templates.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Create a registry with the bundled templates.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Delimited);
        registry
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Check supplied arguments against a template's declared schema.
fn validate_params(
    template: &dyn Template,
    params: &BTreeMap<String, TemplateArg>,
) -> Result<(), TemplateError> {
    let schema = template.params_schema();
    for spec in schema {
        match params.get(spec.name) {
            None if spec.required => {
                return Err(TemplateError::MissingParam {
                    template: template.id().to_string(),
                    param: spec.name.to_string(),
                })
            }
            None => {}
            Some(arg) => {
                let ok = matches!(
                    (spec.kind, arg),
                    (ParamKind::Node, TemplateArg::Node(_))
                        | (ParamKind::Literal, TemplateArg::Literal(_))
                );
                if !ok {
                    return Err(TemplateError::WrongParamKind {
                        template: template.id().to_string(),
                        param: spec.name.to_string(),
                        expected: spec.kind,
                    });
                }
            }
        }
    }
    for supplied in params.keys() {
        if !schema.iter().any(|s| s.name == supplied) {
            return Err(TemplateError::UnknownParam {
                template: template.id().to_string(),
                param: supplied.clone(),
            });
        }
    }
    Ok(())
}

/// Fully expand every template instantiation in the grammar, in place.
/// Afterwards no `TemplateInstantiation` node remains anywhere.
pub fn expand_templates(
    grammar: &mut Grammar,
    registry: &TemplateRegistry,
) -> Result<(), TemplateError> {
    for kind in SectionKind::ALL {
        let mut rules = std::mem::take(grammar.section_mut(kind).children_mut());
        let mut fragments = Vec::new();
        let mut outcome = Ok(());
        for rule in rules.iter_mut() {
            outcome = expand_in_node(rule, grammar, registry, &mut fragments);
            if outcome.is_err() {
                break;
            }
        }
        // The section's rules go back even on failure; the grammar stays
        // structurally whole for error reporting.
        *grammar.section_mut(kind).children_mut() = rules;
        outcome?;
        for fragment in fragments {
            grammar.embed(fragment);
        }
    }
    Ok(())
}

/// Expand instantiations inside one subtree, collecting produced fragments.
fn expand_in_node(
    node: &mut Node,
    grammar: &Grammar,
    registry: &TemplateRegistry,
    fragments: &mut Vec<Fragment>,
) -> Result<(), TemplateError> {
    let mut failure: Option<TemplateError> = None;
    walk(node, None, &mut |n, parent| {
        if failure.is_some() {
            return Visit::skip();
        }
        let Node::TemplateInstantiation { template, params } = n else {
            return Visit::keep();
        };
        let rule_name = match parent {
            Some(p) if matches!(p.kind, NodeKind::Name | NodeKind::Cap) => p.name,
            other => {
                failure = Some(TemplateError::BadParent {
                    template: template.clone(),
                    found: other.map(|p| p.kind),
                });
                return Visit::skip();
            }
        };
        let Some(rule_name) = rule_name else {
            failure = Some(TemplateError::BadParent {
                template: template.clone(),
                found: parent.map(|p| p.kind),
            });
            return Visit::skip();
        };
        match expand_instantiation(template, params, rule_name, grammar, registry, fragments) {
            // The replacement was expanded by hand already: no re-walk.
            Ok(replacement) => Visit::replace(replacement),
            Err(e) => {
                failure = Some(e);
                Visit::skip()
            }
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn expand_instantiation(
    id: &str,
    params: &BTreeMap<String, TemplateArg>,
    rule_name: &str,
    grammar: &Grammar,
    registry: &TemplateRegistry,
    fragments: &mut Vec<Fragment>,
) -> Result<Node, TemplateError> {
    let template = registry.get(id)?;
    validate_params(template, params)?;
    let Expansion {
        mut replacement,
        mut fragment,
    } = template.expand(grammar, rule_name, params)?;
    // Both halves of the expansion may themselves contain nested
    // instantiations; expand them before anything is spliced or
    // substituted.
    expand_fragment(&mut fragment, grammar, registry)?;
    expand_in_node(&mut replacement, grammar, registry, fragments)?;
    fragments.push(fragment);
    Ok(replacement)
}

fn expand_fragment(
    fragment: &mut Fragment,
    grammar: &Grammar,
    registry: &TemplateRegistry,
) -> Result<(), TemplateError> {
    for kind in SectionKind::ALL {
        let mut rules = std::mem::take(fragment.section_mut(kind).children_mut());
        let mut nested = Vec::new();
        let mut outcome = Ok(());
        for rule in rules.iter_mut() {
            outcome = expand_in_node(rule, grammar, registry, &mut nested);
            if outcome.is_err() {
                break;
            }
        }
        *fragment.section_mut(kind).children_mut() = rules;
        outcome?;
        for inner in nested {
            fragment.embed(inner);
        }
    }
    Ok(())
}
