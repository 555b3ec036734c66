//! Template rendering: stamps a parsed [`Template`] against a node's data bag.
//!
//! Lookups walk the scope stack from the innermost `{{#each}}` element out to
//! the node's own data, so outer keys stay visible inside loops. `{{this}}`
//! names the current loop element.

use serde_json::{Map, Value};

use crate::ast::{Segment, Template};
use crate::error::{GameError, Result};
use crate::lexer;
use crate::parser::Parser;

/// What to do with a `{{key}}` that has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unresolved {
    /// Fail with `UnresolvedPlaceholder`.
    #[default]
    Error,
    /// Emit the tag verbatim and log a warning.
    Preserve,
}

/// Parse template source.
pub fn parse(source: &str) -> Result<Template> {
    let tokens = lexer::lex(source)?;
    Parser::new(tokens).parse()
}

/// Parse and render in one step.
pub fn render_str(source: &str, data: &Map<String, Value>, policy: Unresolved) -> Result<String> {
    let template = parse(source)?;
    render(&template, data, policy)
}

/// Render a parsed template against a data bag.
pub fn render(template: &Template, data: &Map<String, Value>, policy: Unresolved) -> Result<String> {
    let root = Scope::Object(data);
    let mut out = String::new();
    render_segments(&template.segments, &mut vec![root], policy, &mut out)?;
    Ok(out)
}

#[derive(Clone, Copy)]
enum Scope<'a> {
    Object(&'a Map<String, Value>),
    Element(&'a Value),
}

fn render_segments<'a>(
    segments: &'a [Segment],
    scopes: &mut Vec<Scope<'a>>,
    policy: Unresolved,
    out: &mut String,
) -> Result<()> {
    for seg in segments {
        match seg {
            Segment::Text(text) => out.push_str(text),
            Segment::Var { key, raw, span } => match lookup(scopes, key) {
                Some(value) => out.push_str(&display_value(value)),
                None => match policy {
                    Unresolved::Error => return Err(GameError::unresolved(key, span.clone())),
                    Unresolved::Preserve => {
                        tracing::warn!(key = %key, "unresolved template placeholder left verbatim");
                        out.push_str(raw);
                    }
                },
            },
            Segment::If {
                key,
                then,
                otherwise,
            } => {
                let branch = if lookup(scopes, key).is_some_and(is_truthy) {
                    then
                } else {
                    otherwise
                };
                render_segments(branch, scopes, policy, out)?;
            }
            Segment::Each { key, body } => {
                // Anything but an array skips the block.
                let Some(Value::Array(items)) = lookup(scopes, key) else {
                    continue;
                };
                // Scopes borrow from the data bag, not from the stack.
                let items: &'a [Value] = items;
                for item in items {
                    scopes.push(Scope::Element(item));
                    let result = render_segments(body, scopes, policy, out);
                    scopes.pop();
                    result?;
                }
            }
        }
    }
    Ok(())
}

/// Resolve a possibly dotted key against the scope stack, innermost first.
fn lookup<'a>(scopes: &[Scope<'a>], key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let head = parts.next()?;

    let start = if head == "this" {
        scopes.iter().rev().find_map(|s| match s {
            Scope::Element(v) => Some(*v),
            Scope::Object(_) => None,
        })?
    } else {
        scopes.iter().rev().find_map(|s| match s {
            Scope::Object(map) => map.get(head),
            Scope::Element(Value::Object(map)) => map.get(head),
            Scope::Element(_) => None,
        })?
    };

    parts.try_fold(start, |value, part| match value {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Truthiness as the generated JavaScript would see it.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form of a value when substituted into code.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(|f| f.to_string()).unwrap_or_default()
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
