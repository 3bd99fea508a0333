//! Rule synthesis: recursively turn a classified `Ty` into named productions.
//!
//! `synthesize` returns the name callers splice into their own rule body plus
//! the rules that still need to be added to the document (possibly none, when
//! the referenced rule was already registered). The only mutable state is the
//! per-compilation `Ctx`; nothing is shared between compilations.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::classify::{classify, Category};
use crate::error::GrammarError;
use crate::ir::{Prim, Scalar, Ty};
use crate::names::{format_name, scoped};

/// Nesting bound for pathological non-cyclic type graphs. Cycles are broken
/// by the visited set before they can reach this.
pub const MAX_DEPTH: usize = 128;

/// A named production, body already rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub body: String,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ::= {}", self.name, self.body)
    }
}

/// Per-compilation state: the dedup registries and the depth guard. Created
/// fresh per top-level compile call and discarded on return.
#[derive(Debug, Default)]
pub struct Ctx {
    visited: HashSet<usize>,
    registered: IndexMap<String, String>,
    any_used: bool,
    depth: usize,
}

impl Ctx {
    /// Register a rule at most once. Re-registering the identical body is a
    /// no-op; the same name with a different body is a hard error.
    fn register(&mut self, name: String, body: String) -> Result<Option<Rule>, GrammarError> {
        if let Some(existing) = self.registered.get(&name) {
            if *existing == body {
                return Ok(None);
            }
            return Err(GrammarError::NameCollision { name });
        }
        self.registered.insert(name.clone(), body.clone());
        Ok(Some(Rule { name, body }))
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered.contains_key(name)
    }

    /// Whether the universal any-value production was referenced anywhere.
    pub fn uses_any(&self) -> bool {
        self.any_used
    }
}

pub fn synthesize(
    t: &Ty,
    owner: &str,
    field: &str,
    ctx: &mut Ctx,
) -> Result<(String, Vec<Rule>), GrammarError> {
    if ctx.depth >= MAX_DEPTH {
        return Err(GrammarError::RecursionGuard { max: MAX_DEPTH });
    }
    ctx.depth += 1;
    let out = synthesize_inner(t, owner, field, ctx);
    ctx.depth -= 1;
    out
}

fn synthesize_inner(
    t: &Ty,
    owner: &str,
    field: &str,
    ctx: &mut Ctx,
) -> Result<(String, Vec<Rule>), GrammarError> {
    match classify(t) {
        Category::Primitive(p) => {
            if p == Prim::Any {
                ctx.any_used = true;
            }
            Ok((p.rule_name().to_string(), Vec::new()))
        }

        Category::Enum { name, values } => {
            // Field-level enums take the owner-field name; a root-level enum
            // keeps its own.
            let rule_name = if owner.is_empty() {
                format_name(name)
            } else {
                scoped(owner, field)
            };
            let body = values
                .iter()
                .map(|v| string_terminal(v))
                .collect::<Vec<_>>()
                .join(" | ");
            finish(ctx, rule_name, body, Vec::new())
        }

        Category::Literal(values) => {
            let rule_name = scoped(owner, field);
            let body = values
                .iter()
                .map(literal_terminal)
                .collect::<Vec<_>>()
                .join(" | ");
            finish(ctx, rule_name, body, Vec::new())
        }

        Category::Collection(element) => {
            let (element_ref, rules) =
                synthesize(element, owner, &format!("{field}-element"), ctx)?;
            let rule_name = scoped(owner, field);
            // The whole element sequence is optional so `[]` stays parseable.
            let body = format!("\"[\" ws ({element_ref} (\",\" ws {element_ref})*)? \"]\"");
            finish(ctx, rule_name, body, rules)
        }

        Category::Dict { key, value } => {
            if !key_renders_as_string(key) {
                return Err(GrammarError::UnsupportedTypeShape(format!(
                    "dictionary key must render as a JSON string, got {}",
                    key.describe()
                )));
            }
            let (key_ref, mut rules) =
                synthesize(key, owner, &format!("{field}-key-type"), ctx)?;
            let (value_ref, value_rules) =
                synthesize(value, owner, &format!("{field}-value-type"), ctx)?;
            rules.extend(value_rules);
            let rule_name = scoped(owner, field);
            let body = format!(
                "\"{{\" ({key_ref} \":\" {value_ref} (\",\" {key_ref} \":\" {value_ref})*)? \"}}\""
            );
            finish(ctx, rule_name, body, rules)
        }

        Category::Optional(inner) => {
            // Inner recursion first: an optional union renders as the union
            // rule plus a trailing null arm, never as a flattened union.
            let (inner_ref, rules) = synthesize(inner, owner, field, ctx)?;
            let rule_name = format!("{}-optional", scoped(owner, field));
            finish(ctx, rule_name, format!("{inner_ref} | null"), rules)
        }

        Category::Union(arms) => {
            let mut rules = Vec::new();
            let mut refs = Vec::with_capacity(arms.len());
            for arm in arms {
                let (arm_ref, arm_rules) = synthesize(arm, owner, field, ctx)?;
                rules.extend(arm_rules);
                refs.push(arm_ref);
            }
            let rule_name = format!("{}-union", scoped(owner, field));
            finish(ctx, rule_name, refs.join(" | "), rules)
        }

        Category::Object(obj) => {
            let rule_name = format_name(obj.name());
            if !ctx.visited.insert(Arc::as_ptr(obj) as usize) {
                // Cycle break: the rule is (being) emitted elsewhere.
                return Ok((rule_name, Vec::new()));
            }
            let mut parts = Vec::with_capacity(obj.fields().len());
            let mut nested = Vec::new();
            for f in obj.fields() {
                let field_rule = format_name(&f.name);
                let (field_ref, field_rules) = synthesize(&f.ty, &rule_name, &field_rule, ctx)?;
                nested.extend(field_rules);
                // The key terminal keeps the original field identifier.
                parts.push(format!("ws {} \": \" {}", string_terminal(&f.name), field_ref));
            }
            let body = if parts.is_empty() {
                "\"{\" ws \"}\"".to_string()
            } else {
                format!(
                    "\"{{\" \"\\n\" {} \"\\n\" ws \"}}\"",
                    parts.join(" \",\" \"\\n\" ")
                )
            };
            let mut rules = Vec::with_capacity(nested.len() + 1);
            if let Some(rule) = ctx.register(rule_name.clone(), body)? {
                rules.push(rule);
            }
            rules.extend(nested);
            Ok((rule_name, rules))
        }

        Category::Opaque(name) => {
            ctx.any_used = true;
            let rule_name = format!("custom-class-{}", format_name(name));
            finish(ctx, rule_name, "value".to_string(), Vec::new())
        }
    }
}

fn finish(
    ctx: &mut Ctx,
    name: String,
    body: String,
    mut rules: Vec<Rule>,
) -> Result<(String, Vec<Rule>), GrammarError> {
    if let Some(rule) = ctx.register(name.clone(), body)? {
        rules.push(rule);
    }
    Ok((name, rules))
}

/// JSON object keys must stay grammar-safe strings.
fn key_renders_as_string(key: &Ty) -> bool {
    match classify(key) {
        Category::Primitive(Prim::String) | Category::Enum { .. } => true,
        Category::Literal(values) => values.iter().all(|v| matches!(v, Scalar::Str(_))),
        _ => false,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TERMINAL RENDERING
// ————————————————————————————————————————————————————————————————————————————

/// Wrap `text` as a GBNF terminal, escaping `"` and `\`.
fn gbnf_terminal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Terminal matching the JSON string literal for `value` (quotes included).
fn string_terminal(value: &str) -> String {
    gbnf_terminal(&format!("\"{}\"", json_escape(value)))
}

fn literal_terminal(value: &Scalar) -> String {
    match value {
        Scalar::Str(s) => string_terminal(s),
        Scalar::Int(i) => gbnf_terminal(&i.to_string()),
        Scalar::Float(f) => gbnf_terminal(&f.to_string()),
        Scalar::Bool(b) => gbnf_terminal(if *b { "true" } else { "false" }),
    }
}

fn json_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
