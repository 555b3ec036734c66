//! Syntax tree for node code templates.
//!
//! The tree is the contract between the template parser and the renderer.
//! Every template construct has exactly one representation here.

use std::ops::Range;

/// A parsed template: a flat run of segments, blocks nest their own runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text, emitted unchanged.
    Text(String),
    /// `{{key}}` or `{{a.b}}`; `raw` is the tag re-emitted without padding.
    Var {
        key: String,
        raw: String,
        span: Range<usize>,
    },
    /// `{{#if key}} … {{else}} … {{/if}}`
    If {
        key: String,
        then: Vec<Segment>,
        otherwise: Vec<Segment>,
    },
    /// `{{#each key}} … {{/each}}`
    Each { key: String, body: Vec<Segment> },
}

impl Template {
    /// All placeholder keys referenced anywhere in the template, in order of
    /// first appearance.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        collect_keys(&self.segments, &mut keys);
        keys
    }
}

fn collect_keys<'a>(segments: &'a [Segment], keys: &mut Vec<&'a str>) {
    for seg in segments {
        match seg {
            Segment::Text(_) => {}
            Segment::Var { key, .. } => push_unique(keys, key),
            Segment::If {
                key,
                then,
                otherwise,
            } => {
                push_unique(keys, key);
                collect_keys(then, keys);
                collect_keys(otherwise, keys);
            }
            Segment::Each { key, body } => {
                push_unique(keys, key);
                collect_keys(body, keys);
            }
        }
    }
}

fn push_unique<'a>(keys: &mut Vec<&'a str>, key: &'a str) {
    if !keys.contains(&key) {
        keys.push(key);
    }
}
