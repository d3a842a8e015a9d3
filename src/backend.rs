//! Backend trait definition
//!
//! This module defines the descriptor every target parser-generator DSL
//! supplies to the generator: the handful of string constants its surface
//! syntax is made of, the escapers, the character-class strategy, and the
//! hooks whose defaults cover the usual suffix-operator family of DSLs.
//! The generator owns all structural work (dispatch, grouping, sections);
//! a backend only decides how each construct is spelled.

use std::fmt;
use std::ops::Range;

use crate::ast::grammar::Grammar;
use crate::ast::node::Preference;
use crate::charclass::{
    char_class_escaper, double_tick_escaper, escape_str, CharClassStrategy, CharSetError, Escaper,
    MergeStyle, DEFAULT_UNIVERSE,
};

/// The output buckets sectioned rendering partitions rules into: the five
/// grammar sections plus the synthetic start-rule marker some DSLs demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SectionId {
    FirstRule,
    Prods,
    Fragmented,
    Keywords,
    Chars,
    Tokens,
}

impl SectionId {
    /// Banner comment text for the bucket.
    pub fn friendly_name(self) -> &'static str {
        match self {
            SectionId::FirstRule => "start rule",
            SectionId::Prods => "productions",
            SectionId::Fragmented => "fragmented",
            SectionId::Keywords => "keywords",
            SectionId::Chars => "characters",
            SectionId::Tokens => "tokens",
        }
    }
}

/// The default flush order for sectioned output.
pub const DEFAULT_SECTION_ORDER: &[SectionId] = &[
    SectionId::Prods,
    SectionId::Fragmented,
    SectionId::Keywords,
    SectionId::Chars,
    SectionId::Tokens,
];

/// Error during a render. Fatal for the render it occurs in; other
/// backends' renders are unaffected since each works on its own copy.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// No backend registered under the requested name.
    BackendNotFound { name: String },
    /// The backend cannot express this construct and no fallback is
    /// configured. Explicit and distinguishable, never a silent no-op.
    Unsupported { backend: String, construct: String },
    /// A `TemplateInstantiation` survived into the generator: templates
    /// must be expanded before rendering. A defect in the caller's
    /// pipeline, not a user error.
    TemplateNotExpanded { template: String },
    /// Character-set reduction failed.
    CharSet(CharSetError),
    /// A grammar with no productions where a start rule was required.
    NoFirstRule { grammar: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::BackendNotFound { name } => {
                write!(f, "backend '{}' not found", name)
            }
            RenderError::Unsupported { backend, construct } => {
                write!(f, "backend '{}' cannot express {}", backend, construct)
            }
            RenderError::TemplateNotExpanded { template } => {
                write!(
                    f,
                    "template '{}' reached the generator unexpanded; expansion must run before rendering",
                    template
                )
            }
            RenderError::CharSet(e) => write!(f, "{}", e),
            RenderError::NoFirstRule { grammar } => {
                write!(f, "grammar '{}' has no production to use as start rule", grammar)
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::CharSet(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CharSetError> for RenderError {
    fn from(e: CharSetError) -> Self {
        RenderError::CharSet(e)
    }
}

/// Descriptor of a target grammar DSL.
///
/// The defaults describe the common suffix-operator family (`x*`, `x+`,
/// `x?`, `name: body;`-ish statements); a backend overrides what its
/// syntax spells differently. Every hook is total: a backend that cannot
/// express a construct returns [`RenderError::Unsupported`] from the
/// relevant hook rather than silently dropping it.
pub trait Backend: Send + Sync + fmt::Debug {
    /// The name of this backend (e.g. "antlr", "pest").
    fn name(&self) -> &str;

    /// Optional description of the target tool.
    fn description(&self) -> &str {
        ""
    }

    /// File extension of the target's grammar files, without the dot.
    fn grammar_extension(&self) -> &str;

    // -- statement surface ---------------------------------------------

    fn assignment_operator(&self) -> &str;

    fn end_statement(&self) -> &str {
        ""
    }

    fn single_line_comment_start(&self) -> &str;

    /// Multi-line comment delimiters, for DSLs that have them. `None`
    /// falls back to a run of single-line comments.
    fn multi_line_comment(&self) -> Option<(&str, &str)> {
        None
    }

    fn alternatives_separator(&self) -> &str {
        " | "
    }

    fn sequence_separator(&self) -> &str {
        " "
    }

    fn group_delimiters(&self) -> (&str, &str) {
        ("(", ")")
    }

    /// The capture operator (e.g. ANTLR's `=`), for DSLs that can label
    /// sub-matches. `None` renders captures transparently.
    fn capturing_operator(&self) -> Option<&str> {
        None
    }

    /// One full rule statement.
    fn rule_statement(&self, name: &str, body: &str) -> String {
        format!(
            "{}{}{}{}",
            name,
            self.assignment_operator(),
            body,
            self.end_statement()
        )
    }

    /// Rule-name spelling fixups (case conventions, reserved words).
    fn rename(&self, name: &str) -> String {
        name.to_string()
    }

    // -- literals and character classes --------------------------------

    fn string_escaper(&self) -> Escaper {
        double_tick_escaper
    }

    fn char_class_escaper(&self) -> Escaper {
        char_class_escaper
    }

    fn string_quote(&self) -> &str {
        "\""
    }

    fn wrap_literal_string(&self, s: &str) -> String {
        format!(
            "{}{}{}",
            self.string_quote(),
            escape_str(self.string_escaper(), s),
            self.string_quote()
        )
    }

    fn wrap_literal_char(&self, c: char) -> String {
        self.wrap_literal_string(&c.to_string())
    }

    fn char_class_strategy(&self) -> CharClassStrategy {
        CharClassStrategy::Merge(MergeStyle::default())
    }

    /// The code-point universe used when a negated set must be rewritten
    /// into its positive complement.
    fn char_universe(&self) -> Range<u32> {
        DEFAULT_UNIVERSE
    }

    // -- repetition ----------------------------------------------------

    fn wrap_zero_or_more(&self, inner: &str) -> String {
        format!("{}*", inner)
    }

    fn wrap_one_or_more(&self, inner: &str) -> String {
        format!("{}+", inner)
    }

    fn wrap_zero_or_one(&self, inner: &str) -> String {
        format!("{}?", inner)
    }

    /// `min` or more repetitions: `min` copies followed by a star, unless
    /// the DSL has a tighter spelling.
    fn wrap_n_or_more(&self, min: u32, inner: &str) -> String {
        let mut parts = vec![inner.to_string(); min as usize];
        parts.push(self.wrap_zero_or_more(inner));
        parts.join(self.sequence_separator())
    }

    // -- conflict preferences ------------------------------------------

    /// Whether this backend gives `Prefer` hints a concrete spelling.
    /// Grouping consults this: preference annotations only force a group
    /// when they actually render to something.
    fn handles_prefer(&self) -> bool {
        false
    }

    fn wrap_prefer(&self, inner: &str, _preference: Preference) -> String {
        inner.to_string()
    }

    // -- document structure --------------------------------------------

    /// Bucket flush order for sectioned output.
    fn section_order(&self) -> &[SectionId] {
        DEFAULT_SECTION_ORDER
    }

    /// Whether to synthesize a `start` rule bound to the first production
    /// (DSLs with a fixed entry-point name).
    fn synthesize_start_rule(&self) -> bool {
        false
    }

    /// Lines emitted after the header comment, before any section (e.g.
    /// ANTLR's `grammar X;`).
    fn start_lines(&self, _grammar: &Grammar) -> Vec<String> {
        Vec::new()
    }

    /// Lines emitted after the last section.
    fn end_lines(&self, _grammar: &Grammar) -> Vec<String> {
        Vec::new()
    }
}
