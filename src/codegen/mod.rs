use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::Value;

use crate::ast::Template;
use crate::error::Result;
use crate::graph::{Graph, Node, NodeId};
use crate::nodes::{prefix_from_type, AssetRef, NodeDef, NodeKind, StageProps};
use crate::template::{self, Unresolved};

mod naming;
mod prelude;
mod walk;

#[cfg(test)]
mod tests;

pub use self::naming::VariableNames;
use self::prelude::PRELUDE_JS;

// ── Public types ───────────────────────────────────────────────────────

/// Knobs for one generation pass.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Handling of `{{key}}` tokens with no value.
    pub unresolved: Unresolved,
    /// Header timestamp; `None` uses the current time.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Full generation output: the program plus metadata for the runtime shell
/// and the exporter.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The generated JavaScript program.
    pub code: String,
    pub node_count: usize,
    /// Distinct node type tags, in emission order.
    pub node_types: Vec<String>,
    /// Variable assigned to each node, in emission order.
    pub variables: IndexMap<NodeId, String>,
    /// Files referenced by nodes, de-duplicated by URL.
    pub assets: Vec<AssetRef>,
    /// Canvas settings from the first stage node, if any.
    pub stage: Option<StageProps>,
    /// Non-fatal issues the user should know about.
    pub warnings: Vec<String>,
}

/// Generate the game program for a graph.
pub fn generate(graph: &Graph, options: &GenerateOptions) -> Result<CompileOutput> {
    let order = walk::emission_order(graph)?;
    let mut names = VariableNames::new();
    let mut templates: HashMap<&'static str, Template> = HashMap::new();
    let mut defs: HashMap<NodeId, &'static NodeDef> = HashMap::new();

    let mut node_types: Vec<String> = Vec::new();
    let mut variables = IndexMap::new();
    let mut assets: Vec<AssetRef> = Vec::new();
    let mut stage = None;
    let mut warnings = Vec::new();
    let mut fragments = Vec::with_capacity(order.len());

    for id in order {
        let Some(node) = graph.node(id) else {
            continue;
        };
        let title = node.display_title().to_string();
        let kind = NodeKind::from_node(node).map_err(|e| e.at_node(id, &title))?;
        let def = kind.def();

        let prefix = def
            .prefix
            .map(str::to_string)
            .unwrap_or_else(|| prefix_from_type(&node.node_type));
        let var = names.assign(id, &prefix).to_string();
        tracing::debug!(node = id, var = %var, node_type = %node.node_type, "emitting node");

        if !node_types.contains(&node.node_type) {
            node_types.push(node.node_type.clone());
        }
        for asset in kind.assets() {
            if !assets.iter().any(|a| a.url == asset.url) {
                assets.push(asset);
            }
        }
        if let NodeKind::Stage(props) = &kind {
            if stage.is_none() {
                stage = Some(props.clone());
            } else {
                warnings.push(format!("node #{id} '{title}': only the first stage node sizes the canvas"));
            }
        }
        for lint in kind.lint() {
            warnings.push(format!("node #{id} '{title}': {lint}"));
        }

        let mut bag = kind.property_bag();
        bag.insert("var".into(), Value::String(var.clone()));
        bag.insert("id".into(), Value::from(id));
        bag.insert("title".into(), Value::String(title.clone()));
        bind_inputs(graph, node, def, &names, &defs, &mut bag, &mut warnings);

        let parsed = match templates.entry(def.type_tag) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => slot.insert(template::parse(def.template).map_err(|e| e.at_node(id, &title))?),
        };
        let body = template::render(parsed, &bag, options.unresolved).map_err(|e| e.at_node(id, &title))?;

        fragments.push(emit_fragment(node, &title, &var, &body));
        variables.insert(id, var);
        defs.insert(id, def);
    }

    let timestamp = options.timestamp.unwrap_or_else(Utc::now);
    let code = assemble(&timestamp, variables.len(), &node_types, &fragments);

    Ok(CompileOutput {
        code,
        node_count: variables.len(),
        node_types,
        variables,
        assets,
        stage,
        warnings,
    })
}

/// Bind every input slot to the upstream node's variable, or the slot's
/// default when nothing is linked.
fn bind_inputs(
    graph: &Graph,
    node: &Node,
    def: &NodeDef,
    names: &VariableNames,
    defs: &HashMap<NodeId, &'static NodeDef>,
    bag: &mut serde_json::Map<String, Value>,
    warnings: &mut Vec<String>,
) {
    let slots = graph.input_slot_count(node.id).max(def.inputs.len());

    for slot in 0..slots {
        let slot_def = def.inputs.get(slot);
        // Templates reference declared slots by their catalog name; the
        // editor's label only names extra slots the catalog doesn't know.
        let name = match slot_def {
            Some(d) => d.name,
            None => match node.inputs.get(slot).map(|s| s.name.as_str()).filter(|n| !n.is_empty()) {
                Some(label) => label,
                None => continue,
            },
        };
        if slot_def.is_none() && bag.contains_key(name) {
            warnings.push(format!(
                "node #{} '{}': input '{name}' clashes with a node field and is ignored",
                node.id,
                node.display_title()
            ));
            continue;
        }

        let links = graph.links_into(node.id, slot);
        if links.len() > 1 {
            warnings.push(format!(
                "node #{} '{}': input '{name}' has {} links, only the first is used",
                node.id,
                node.display_title(),
                links.len()
            ));
        }

        let bound = links
            .first()
            .and_then(|link| {
                let var = names.get(link.origin_id)?;
                let expr = match defs.get(&link.origin_id) {
                    Some(origin) => origin.output_expr(var, link.origin_slot),
                    None => var.to_string(),
                };
                Some(Value::String(expr))
            })
            .or_else(|| slot_def.and_then(|d| d.default).map(|d| Value::String(d.to_string())))
            .unwrap_or(Value::Null);
        bag.insert(name.to_string(), bound);
    }
}

/// One node's code, with its traceability comment, indented into the body of
/// `initGame`.
fn emit_fragment(node: &Node, title: &str, var: &str, body: &str) -> String {
    let mut out = format!(
        "    // ── Node #{}: {} ({}) -> {var}\n",
        node.id,
        comment_safe(title),
        comment_safe(&node.node_type)
    );
    for line in body.lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

fn comment_safe(s: &str) -> String {
    s.replace(['\n', '\r'], " ")
}

fn assemble(timestamp: &DateTime<Utc>, node_count: usize, node_types: &[String], fragments: &[String]) -> String {
    let types = if node_types.is_empty() {
        "(none)".to_string()
    } else {
        node_types.join(", ")
    };

    let mut s = String::new();
    s.push_str(&format!("// Generated by nodegame {}\n", env!("CARGO_PKG_VERSION")));
    s.push_str(&format!(
        "// Generated at: {}\n",
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    s.push_str(&format!("// Nodes: {node_count}\n"));
    s.push_str(&format!("// Node types: {types}\n"));
    s.push_str("(function (global) {\n");
    s.push_str("  'use strict';\n\n");
    s.push_str(PRELUDE_JS);
    s.push('\n');
    s.push_str("  function initGame(app) {\n");
    s.push_str("    const root = new PIXI.Container();\n");
    s.push_str("    root.sortableChildren = true;\n");
    s.push_str("    app.stage.addChild(root);\n");
    s.push_str("    const updaters = [];\n");
    s.push_str("    const disposers = [];\n\n");

    for fragment in fragments {
        s.push_str(fragment);
        s.push('\n');
    }

    s.push_str(
        r#"    return {
      update(deltaTime) {
        for (const fn of updaters) fn(deltaTime);
      },
      destroy() {
        for (const fn of disposers.splice(0)) {
          try { fn(); } catch (e) { console.error('[nodegame] dispose failed', e); }
        }
        updaters.length = 0;
        app.stage.removeChild(root);
        root.destroy({ children: true });
      },
    };
  }

  global.initGame = initGame;
})(typeof window !== 'undefined' ? window : globalThis);
"#,
    );
    s
}
