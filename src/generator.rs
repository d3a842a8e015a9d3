//! The generator: IR to backend grammar text
//!
//! One rendering pass walks an expanded grammar and produces the target
//! DSL's source text. The generator owns everything structural and asks the
//! [`Backend`] descriptor only how constructs are spelled:
//!
//! - **dispatch**: an exhaustive match over the node variants, so every
//!   backend handles every construct or fails loudly;
//! - **auto-grouping**: a short rule table over (node, visible parent)
//!   pairs decides where explicit delimiters are required to preserve the
//!   tree's structure in flat text. The grouping substitutes a synthetic
//!   `Group` for dispatch purposes only and never mutates the tree;
//! - **sections**: rendered rules collect into named buckets (the five
//!   grammar sections plus synthetic ones such as the start-rule marker)
//!   and flush in the backend's configured order, each behind a banner
//!   comment, empty buckets omitted.
//!
//! Per-render state (ancestor stack, production-name cursor, buckets) lives
//! in one `Generator` value per call; renders never share state, so
//! rendering the same grammar twice yields byte-identical text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ast::grammar::{Grammar, SectionKind};
use crate::ast::node::{Node, NodeKind};
use crate::backend::{Backend, RenderError, SectionId};
use crate::charclass::{
    char_ranges, escape_str, merge_ranges, to_positive_union, CharClassStrategy, Escaper,
    KeepStyle, MergeStyle,
};

/// Where generated files say they come from.
pub const PROJECT_LINK: &str = "https://github.com/adebert/grambel";

/// The outcome of one (grammar, backend) render: the grammar's identifier
/// and the newline-joined target-DSL source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranspiledResult {
    pub id: String,
    pub text: String,
}

impl std::fmt::Display for TranspiledResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Render `grammar` into `backend`'s DSL. The grammar must already be
/// template-expanded; an instantiation encountered here is a fatal
/// internal-consistency error.
pub fn transpile(backend: &dyn Backend, grammar: &Grammar) -> Result<TranspiledResult, RenderError> {
    let mut gen = Generator::new(backend);
    let mut lines = gen.header_lines(grammar)?;
    lines.extend(backend.start_lines(grammar));
    gen.fill_buckets(grammar)?;
    if backend.synthesize_start_rule() {
        gen.synthesize_start_rule(grammar)?;
    }
    for &section in backend.section_order() {
        gen.flush_section(section, grammar, &mut lines)?;
    }
    lines.extend(backend.end_lines(grammar));
    Ok(TranspiledResult {
        id: grammar.meta.id.clone(),
        text: lines.join("\n"),
    })
}

enum BucketEntry {
    Rule { name: String, body: String },
    Raw(String),
}

/// Per-render state. One per (grammar, backend) render, never shared.
pub struct Generator<'a> {
    backend: &'a dyn Backend,
    /// Kinds of the stack-visible ancestors of the node being dispatched.
    stack: Vec<NodeKind>,
    /// The rule name currently being rendered; rule dispatch may rewrite it
    /// before the rule is emplaced.
    current_prod_name: Option<String>,
    current_bucket: SectionId,
    buckets: BTreeMap<SectionId, Vec<BucketEntry>>,
}

fn bucket_for(kind: SectionKind) -> SectionId {
    match kind {
        SectionKind::Chars => SectionId::Chars,
        SectionKind::Keywords => SectionId::Keywords,
        SectionKind::Tokens => SectionId::Tokens,
        SectionKind::Fragmented => SectionId::Fragmented,
        SectionKind::Prods => SectionId::Prods,
    }
}

impl<'a> Generator<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Generator {
            backend,
            stack: Vec::new(),
            current_prod_name: None,
            current_bucket: SectionId::Prods,
            buckets: BTreeMap::new(),
        }
    }

    // -- document assembly ---------------------------------------------

    fn header_lines(&mut self, grammar: &Grammar) -> Result<Vec<String>, RenderError> {
        let meta = &grammar.meta;
        let mut greeting = Vec::new();
        greeting.push(format!("Generated by grambel ({})", PROJECT_LINK));
        if self.backend.description().is_empty() {
            greeting.push(format!("for the {} DSL", self.backend.name()));
        } else {
            greeting.push(format!(
                "for the {} DSL ({})",
                self.backend.name(),
                self.backend.description()
            ));
        }
        greeting.push(String::new());
        if let Some(doc) = &meta.doc {
            for line in doc.lines() {
                greeting.push(line.trim().to_string());
            }
            greeting.push(String::new());
        }
        if !meta.doc_ref.is_empty() {
            greeting.push("References:".to_string());
            for r in &meta.doc_ref {
                greeting.push(format!("\t{}", r.trim()));
            }
        }
        if let Some(pattern) = &meta.filename_regexp {
            greeting.push(format!(
                "Use with files whose names match the regexp: {}",
                pattern
            ));
        }
        let comment = self.resolve(&Node::MultiLineComment { lines: greeting }, grammar)?;
        let spacer = self.resolve(&Node::Spacer { count: 2 }, grammar)?;
        Ok(vec![comment, spacer])
    }

    /// Render every section rule into its bucket.
    fn fill_buckets(&mut self, grammar: &Grammar) -> Result<(), RenderError> {
        for kind in SectionKind::ALL {
            self.current_bucket = bucket_for(kind);
            for entry in grammar.section(kind).children() {
                match entry {
                    Node::Name { name, child } => {
                        self.stack.push(NodeKind::Name);
                        let outcome = self.render_rule(name, child, grammar);
                        self.stack.pop();
                        outcome?;
                    }
                    // Cosmetic entries pass through as already-rendered text.
                    Node::Comment { .. } | Node::MultiLineComment { .. } | Node::Spacer { .. } => {
                        let text = self.resolve(entry, grammar)?;
                        self.bucket().push(BucketEntry::Raw(text));
                    }
                    other => {
                        return Err(RenderError::Unsupported {
                            backend: self.backend.name().to_string(),
                            construct: format!("a {} as a section entry", other.kind()),
                        })
                    }
                }
            }
        }
        Ok(())
    }

    /// Render one rule body under a fresh production-name cursor and defer
    /// it into the current bucket.
    fn render_rule(&mut self, name: &str, child: &Node, grammar: &Grammar) -> Result<(), RenderError> {
        let saved = std::mem::replace(&mut self.current_prod_name, Some(name.to_string()));
        let body = self.resolve(child, grammar);
        let emplaced_name = self.current_prod_name.take();
        self.current_prod_name = saved;
        let body = body?;
        let name = emplaced_name.unwrap_or_else(|| name.to_string());
        self.bucket().push(BucketEntry::Rule { name, body });
        Ok(())
    }

    fn bucket(&mut self) -> &mut Vec<BucketEntry> {
        self.buckets.entry(self.current_bucket).or_default()
    }

    fn synthesize_start_rule(&mut self, grammar: &Grammar) -> Result<(), RenderError> {
        let (first, _) = grammar
            .section(SectionKind::Prods)
            .find_first_rule()
            .ok_or_else(|| RenderError::NoFirstRule {
                grammar: grammar.meta.id.clone(),
            })?;
        let body = self.backend.rename(first);
        self.buckets
            .entry(SectionId::FirstRule)
            .or_default()
            .push(BucketEntry::Rule {
                name: "start".to_string(),
                body,
            });
        Ok(())
    }

    fn flush_section(
        &mut self,
        id: SectionId,
        grammar: &Grammar,
        lines: &mut Vec<String>,
    ) -> Result<(), RenderError> {
        let Some(entries) = self.buckets.remove(&id) else {
            return Ok(());
        };
        if entries.is_empty() {
            return Ok(());
        }
        let banner = Node::Comment {
            value: id.friendly_name().to_string(),
        };
        lines.push(self.resolve(&banner, grammar)?);
        for entry in entries {
            match entry {
                BucketEntry::Rule { name, body } => {
                    lines.push(
                        self.backend
                            .rule_statement(&self.backend.rename(&name), &body),
                    );
                }
                BucketEntry::Raw(text) => lines.push(text),
            }
        }
        lines.push(self.resolve(&Node::Spacer { count: 2 }, grammar)?);
        Ok(())
    }

    // -- dispatch ------------------------------------------------------

    /// Render one node, inserting a synthetic group around it when the
    /// grouping rules require one. The substitution is transparent: the
    /// tree itself is never touched.
    pub fn resolve(&mut self, node: &Node, grammar: &Grammar) -> Result<String, RenderError> {
        if self.needs_group(node) {
            let inner = self.dispatch(node, grammar)?;
            let (open, close) = self.backend.group_delimiters();
            Ok(format!("{}{}{}", open, inner, close))
        } else {
            self.dispatch(node, grammar)
        }
    }

    /// The grouping rule table, evaluated against the node's nearest
    /// stack-visible ancestor. First matching rule wins.
    fn needs_group(&self, node: &Node) -> bool {
        let Some(&parent) = self.stack.last() else {
            return false;
        };
        let this = node.kind();
        // Adjacent repeat operators are ambiguous without delimiters.
        if this == NodeKind::Iter && parent == NodeKind::Iter {
            return true;
        }
        // Same-kind nodes flatten correctly when joined.
        if this == parent {
            return false;
        }
        // A preference annotation only forces a group when the backend
        // actually renders it to something.
        if this == NodeKind::Prefer {
            return self.backend.handles_prefer();
        }
        // Nested sequence/alternation must be delimited, unless an
        // enclosing preference annotation already owns the precedence.
        if matches!(this, NodeKind::Seq | NodeKind::Alt) {
            return parent != NodeKind::Prefer;
        }
        // A capture inside a repeat must bind the repeat to the whole
        // captured unit.
        this == NodeKind::Cap && parent == NodeKind::Iter
    }

    fn dispatch(&mut self, node: &Node, grammar: &Grammar) -> Result<String, RenderError> {
        let visible = !node.stack_invisible();
        if visible {
            self.stack.push(node.kind());
        }
        let result = self.dispatch_inner(node, grammar);
        if visible {
            self.stack.pop();
        }
        result
    }

    fn dispatch_inner(&mut self, node: &Node, grammar: &Grammar) -> Result<String, RenderError> {
        match node {
            Node::Ref { name } => Ok(self.backend.rename(name)),
            Node::Lit { value } => Ok(self.backend.wrap_literal_string(value)),
            Node::CharClass { chars, negative } => {
                // The common single-character case needs no set syntax.
                let mut it = chars.chars();
                if let (Some(c), None, false) = (it.next(), it.next(), *negative) {
                    return Ok(self.backend.wrap_literal_char(c));
                }
                self.render_char_set(node, grammar)
            }
            Node::CharRange { .. } | Node::WellKnown { .. } | Node::CharClassUnion { .. } => {
                self.render_char_set(node, grammar)
            }
            Node::Name { name, child } => {
                // A rule discovered mid-render: defer it into the current
                // bucket and refer to it by name inline.
                self.render_rule(name, child, grammar)?;
                Ok(self.backend.rename(name))
            }
            Node::Cap { name, child } => {
                let inner = self.resolve(child, grammar)?;
                Ok(match self.backend.capturing_operator() {
                    Some(op) => format!("{}{}{}", name, op, inner),
                    None => inner,
                })
            }
            Node::UnCap { child } => self.resolve(child, grammar),
            Node::Opt { child } => {
                let inner = self.resolve(child, grammar)?;
                Ok(self.backend.wrap_zero_or_one(&inner))
            }
            Node::Iter { child, min, max } => self.render_iter(child, *min, *max, grammar),
            Node::Prefer { child, preference } => {
                let inner = self.resolve(child, grammar)?;
                Ok(self.backend.wrap_prefer(&inner, *preference))
            }
            Node::Group { child } => {
                // Grouping is suppressed for the immediate child: the group
                // itself is the delimiter.
                let inner = self.dispatch(child, grammar)?;
                let (open, close) = self.backend.group_delimiters();
                Ok(format!("{}{}{}", open, inner, close))
            }
            Node::Seq { children } => {
                let parts = children
                    .iter()
                    .map(|c| self.resolve(c, grammar))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(parts.join(self.backend.sequence_separator()))
            }
            Node::Alt { children } => {
                let parts = children
                    .iter()
                    .map(|c| self.resolve(c, grammar))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(parts.join(self.backend.alternatives_separator()))
            }
            Node::TemplateInstantiation { template, .. } => Err(RenderError::TemplateNotExpanded {
                template: template.clone(),
            }),
            Node::Comment { value } => Ok(format!(
                "{}{}",
                self.backend.single_line_comment_start(),
                value
            )),
            Node::MultiLineComment { lines } => Ok(self.render_multi_line_comment(lines)),
            Node::Spacer { count } => {
                // Lines are newline-joined later, so an empty line needs one
                // fewer break than the requested count.
                Ok("\n".repeat(count.saturating_sub(1) as usize))
            }
        }
    }

    fn render_multi_line_comment(&self, lines: &[String]) -> String {
        if let Some((open, close)) = self.backend.multi_line_comment() {
            let mut out = String::from(open);
            out.push('\n');
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(close);
            out
        } else {
            let start = self.backend.single_line_comment_start();
            lines
                .iter()
                .map(|line| {
                    if line.is_empty() {
                        String::new()
                    } else {
                        format!("{}{}", start, line)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }

    fn render_iter(
        &mut self,
        child: &Node,
        min: u32,
        max: Option<u32>,
        grammar: &Grammar,
    ) -> Result<String, RenderError> {
        let inner = self.resolve(child, grammar)?;
        match max {
            None => Ok(match min {
                0 => self.backend.wrap_zero_or_more(&inner),
                1 => self.backend.wrap_one_or_more(&inner),
                n => self.backend.wrap_n_or_more(n, &inner),
            }),
            // A bounded repeat hardcodes into min copies plus optional
            // tails; DSL-level bounded-repeat syntax is too rare to rely on.
            Some(max) => {
                let optional = self.backend.wrap_zero_or_one(&inner);
                let mut parts = vec![inner; min as usize];
                for _ in min..max {
                    parts.push(optional.clone());
                }
                Ok(parts.join(self.backend.sequence_separator()))
            }
        }
    }

    // -- character classes ---------------------------------------------

    fn render_char_set(&mut self, node: &Node, grammar: &Grammar) -> Result<String, RenderError> {
        match self.backend.char_class_strategy() {
            CharClassStrategy::Merge(style) => self.render_merge(&style, node, grammar),
            CharClassStrategy::Keep(style) => self.render_keep(&style, node, grammar),
        }
    }

    fn unsupported(&self, construct: &str) -> RenderError {
        RenderError::Unsupported {
            backend: self.backend.name().to_string(),
            construct: construct.to_string(),
        }
    }

    fn wrap_set(
        &self,
        open: &str,
        close: &str,
        negate_inner: &str,
        negate_outer: &str,
        negative: bool,
        body: &str,
    ) -> Result<String, RenderError> {
        if negative && negate_inner.is_empty() && negate_outer.is_empty() {
            return Err(self.unsupported("a negated character class"));
        }
        let inner = if negative { negate_inner } else { "" };
        let outer = if negative { negate_outer } else { "" };
        Ok(format!("{}{}{}{}{}", outer, open, inner, body, close))
    }

    fn render_merge(
        &mut self,
        style: &MergeStyle,
        node: &Node,
        grammar: &Grammar,
    ) -> Result<String, RenderError> {
        let escaper = self.backend.char_class_escaper();
        let negative = crate::charclass::polarity(node).unwrap_or(false);
        let body = match node {
            // An explicit enumeration keeps its spelling; only unions and
            // ranges coalesce.
            Node::CharClass { chars, .. } => escape_str(escaper, chars),
            _ => {
                let runs = merge_ranges(char_ranges(node, Some(grammar))?);
                let mut body = String::new();
                for run in runs {
                    if run.end - run.start == 1 {
                        body.push_str(&escape_code_point(escaper, run.start));
                    } else {
                        body.push_str(&escape_code_point(escaper, run.start));
                        body.push_str(style.range_separator);
                        body.push_str(&escape_code_point(escaper, run.end - 1));
                    }
                }
                body
            }
        };
        self.wrap_set(
            style.set_open,
            style.set_close,
            style.negate_inner,
            style.negate_outer,
            negative,
            &body,
        )
    }

    fn render_keep(
        &mut self,
        style: &KeepStyle,
        node: &Node,
        grammar: &Grammar,
    ) -> Result<String, RenderError> {
        match node {
            Node::CharClassUnion { children, negative } => {
                let joiner = if *negative {
                    style.negative_joiner
                } else {
                    style.positive_joiner
                };
                match joiner {
                    Some(joiner) => {
                        let parts = children
                            .iter()
                            .map(|c| self.resolve(c, grammar))
                            .collect::<Result<Vec<_>, _>>()?;
                        let joined = parts.join(joiner);
                        if *negative {
                            if style.negate_outer.is_empty() {
                                return Err(self.unsupported("a negated character union"));
                            }
                            Ok(format!("{}{}", style.negate_outer, joined))
                        } else {
                            Ok(joined)
                        }
                    }
                    None => {
                        if !negative {
                            return Err(self.unsupported(
                                "a character union (no positive joiner configured)",
                            ));
                        }
                        let positive = to_positive_union(
                            node,
                            Some(grammar),
                            self.backend.char_universe(),
                        )?;
                        self.render_keep(style, &positive, grammar)
                    }
                }
            }
            Node::CharClass { chars, negative } => {
                if style.split_class_chars {
                    // Spell the set as joined single-character literals.
                    let as_union = Node::CharClassUnion {
                        children: chars
                            .chars()
                            .map(|c| Node::CharRange {
                                first: c as u32,
                                last: c as u32,
                                negative: false,
                            })
                            .collect(),
                        negative: *negative,
                    };
                    self.render_keep(style, &as_union, grammar)
                } else if *negative
                    && style.negate_inner.is_empty()
                    && style.negate_outer.is_empty()
                {
                    // No negation spelling: fall back to the positive
                    // complement.
                    let positive =
                        to_positive_union(node, Some(grammar), self.backend.char_universe())?;
                    self.render_keep(style, &positive, grammar)
                } else {
                    let body = escape_str(self.backend.char_class_escaper(), chars);
                    self.wrap_set(
                        style.set_open,
                        style.set_close,
                        style.negate_inner,
                        style.negate_outer,
                        *negative,
                        &body,
                    )
                }
            }
            Node::CharRange {
                first,
                last,
                negative,
            } => {
                if *negative && style.negate_outer.is_empty() {
                    let positive =
                        to_positive_union(node, Some(grammar), self.backend.char_universe())?;
                    return self.render_keep(style, &positive, grammar);
                }
                let rendered = if first == last {
                    // A degenerate range is just the character.
                    self.wrap_code_point(*first)
                } else {
                    format!(
                        "{}{}{}",
                        self.wrap_code_point(*first),
                        style.range_separator,
                        self.wrap_code_point(*last)
                    )
                };
                if *negative {
                    Ok(format!("{}{}", style.negate_outer, rendered))
                } else {
                    Ok(rendered)
                }
            }
            Node::WellKnown { name: _, negative } => {
                // Expand through the table and render the equivalent union.
                let runs = merge_ranges(char_ranges(node, Some(grammar))?);
                let as_union = Node::CharClassUnion {
                    children: runs
                        .into_iter()
                        .map(|r| Node::CharRange {
                            first: r.start,
                            last: r.end - 1,
                            negative: false,
                        })
                        .collect(),
                    negative: *negative,
                };
                self.render_keep(style, &as_union, grammar)
            }
            other => Err(RenderError::CharSet(
                crate::charclass::CharSetError::NotACharSet {
                    found: other.kind(),
                },
            )),
        }
    }

    fn wrap_code_point(&self, cp: u32) -> String {
        match char::from_u32(cp) {
            Some(c) => self.backend.wrap_literal_char(c),
            None => format!("\\u{:04X}", cp),
        }
    }
}

fn escape_code_point(escaper: Escaper, cp: u32) -> String {
    match char::from_u32(cp) {
        Some(c) => escaper(c),
        None => format!("\\u{:04X}", cp),
    }
}
