//! Z-index layer table: dotted component paths to stacking order.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ErrorKind, GameError, Result};
use crate::nodes::js_string;

const STYLE_ELEMENT_ID: &str = "nodegame-layers";

/// Flat table of `PATH.SUB` → z-index, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerTable {
    layers: IndexMap<String, i32>,
}

impl Default for LayerTable {
    fn default() -> Self {
        let layers = [
            ("BASE", 0),
            ("GAME.STAGE", 10),
            ("GAME.HUD", 50),
            ("EDITOR.GRAPH", 100),
            ("EDITOR.TOOLBAR", 200),
            ("EDITOR.SIDEBAR", 300),
            ("EDITOR.PREVIEW", 400),
            ("FLOATING.PANELS", 1000),
            ("FLOATING.MENUS", 1100),
            ("FLOATING.TOOLTIPS", 1200),
            ("MODAL.BACKDROP", 2000),
            ("MODAL.DIALOG", 2010),
            ("NOTIFICATIONS", 3000),
            ("DEBUG.CONSOLE", 9000),
            ("DEBUG.OVERLAY", 9999),
        ];
        Self {
            layers: layers.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

impl LayerTable {
    pub fn empty() -> Self {
        Self { layers: IndexMap::new() }
    }

    /// Stacking order for a dotted path, e.g. `FLOATING.PANELS`.
    pub fn get(&self, path: &str) -> Result<i32> {
        self.layers
            .get(path)
            .copied()
            .ok_or_else(|| ErrorKind::UnknownLayer(path.to_string()).into())
    }

    pub fn set(&mut self, path: &str, z: i32) {
        self.layers.insert(path.to_string(), z);
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, i32)> {
        self.layers.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Apply overrides from a nested JSON object. `{"FLOATING": {"PANELS": 5}}`
    /// and `{"FLOATING.PANELS": 5}` are equivalent.
    pub fn apply_overrides(&mut self, overrides: &Value) -> Result<()> {
        let Value::Object(map) = overrides else {
            return Err(GameError::message("layer overrides must be a JSON object"));
        };
        for (key, value) in map {
            self.apply_at(key, value)?;
        }
        Ok(())
    }

    fn apply_at(&mut self, path: &str, value: &Value) -> Result<()> {
        match value {
            Value::Object(children) => {
                for (key, child) in children {
                    self.apply_at(&format!("{path}.{key}"), child)?;
                }
                Ok(())
            }
            Value::Number(n) => {
                let z = n
                    .as_i64()
                    .and_then(|z| i32::try_from(z).ok())
                    .ok_or_else(|| GameError::message(format!("layer '{path}': z-index {n} is not a 32-bit integer")))?;
                self.set(path, z);
                Ok(())
            }
            other => Err(GameError::message(format!(
                "layer '{path}': expected a number or object, got {other}"
            ))),
        }
    }

    /// `FLOATING.PANELS` → `z-floating-panels`.
    pub fn class_name(path: &str) -> String {
        let slug: String = path
            .chars()
            .map(|c| match c {
                '.' | '_' | ' ' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        format!("z-{slug}")
    }

    /// One CSS rule per layer.
    pub fn css(&self) -> String {
        let mut out = String::new();
        for (path, z) in &self.layers {
            out.push_str(&format!(".{} {{ z-index: {z}; }}\n", Self::class_name(path)));
        }
        out
    }

    /// Script that installs (or replaces) the layer rules in the current
    /// document.
    pub fn injection_js(&self) -> String {
        format!(
            r#"(function () {{
  if (typeof document === 'undefined') return;
  var el = document.getElementById({id});
  if (!el) {{
    el = document.createElement('style');
    el.id = {id};
    document.head.appendChild(el);
  }}
  el.textContent = {css};
}})();
"#,
            id = js_string(STYLE_ELEMENT_ID),
            css = js_string(&self.css()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_lookup() {
        let table = LayerTable::default();
        assert_eq!(table.get("FLOATING.PANELS").unwrap(), 1000);
        assert!(table.get("BASE").unwrap() < table.get("MODAL.DIALOG").unwrap());
    }

    #[test]
    fn unknown_path_is_an_error() {
        let err = LayerTable::default().get("FLOATING.NOPE").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownLayer(ref p) if p == "FLOATING.NOPE"));
    }

    #[test]
    fn nested_and_dotted_overrides() {
        let mut table = LayerTable::default();
        table
            .apply_overrides(&json!({"FLOATING": {"PANELS": 1500}, "GAME.HUD": 60, "CUSTOM": {"TOAST": 4000}}))
            .unwrap();
        assert_eq!(table.get("FLOATING.PANELS").unwrap(), 1500);
        assert_eq!(table.get("GAME.HUD").unwrap(), 60);
        assert_eq!(table.get("CUSTOM.TOAST").unwrap(), 4000);
        assert_eq!(table.entries().last(), Some(("CUSTOM.TOAST", 4000)));
    }

    #[test]
    fn overrides_reject_non_numbers() {
        let mut table = LayerTable::default();
        assert!(table.apply_overrides(&json!({"BASE": "high"})).is_err());
        assert!(table.apply_overrides(&json!([1, 2])).is_err());
    }

    #[test]
    fn css_rules() {
        let css = LayerTable::default().css();
        assert!(css.contains(".z-floating-panels { z-index: 1000; }"));
        assert!(css.contains(".z-base { z-index: 0; }"));
    }

    #[test]
    fn injection_script_embeds_rules() {
        let mut table = LayerTable::empty();
        table.set("DEBUG.OVERLAY", 9);
        let js = table.injection_js();
        assert!(js.contains("document.createElement('style')"));
        assert!(js.contains(r#""nodegame-layers""#));
        assert!(js.contains(r#"".z-debug-overlay { z-index: 9; }\n""#));
    }
}
