//! Project build settings, read from a JSON file next to the graph.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GameError, Result};
use crate::layers::LayerTable;
use crate::modules::{parse_configs, ModuleConfig, ModuleRegistry};
use crate::template::Unresolved;

/// Looked up beside the graph file when no config is given.
pub const CONFIG_FILE_NAME: &str = "nodegame.json";

pub const DEFAULT_PIXI_URL: &str = "https://cdn.jsdelivr.net/npm/pixi.js@7.4.2/dist/pixi.min.js";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfig {
    /// Page title of the exported game.
    pub title: String,
    /// Canvas size; overrides the stage node when set.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub background: Option<String>,
    /// Unresolved template placeholders fail the build when true.
    pub strict: bool,
    /// Rendering library script URL.
    pub pixi_url: String,
    /// Merged over the stock module set.
    pub modules: IndexMap<String, ModuleConfig>,
    /// Nested z-index overrides, see [`LayerTable::apply_overrides`].
    pub layers: Option<Value>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            title: "nodegame".to_string(),
            width: None,
            height: None,
            background: None,
            strict: true,
            pixi_url: DEFAULT_PIXI_URL.to_string(),
            modules: IndexMap::new(),
            layers: None,
        }
    }
}

impl BuildConfig {
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| GameError::io(format!("cannot read config '{}'", path.display()), e))?;
        Self::from_json(&source)
    }

    /// Config for a graph file: `explicit` if given, else `nodegame.json`
    /// beside the graph, else defaults.
    pub fn for_graph(graph: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let sibling = graph.parent().unwrap_or(Path::new(".")).join(CONFIG_FILE_NAME);
        if sibling.is_file() {
            tracing::debug!(config = %sibling.display(), "using project config");
            return Self::load(&sibling);
        }
        Ok(Self::default())
    }

    /// Merge a module configuration file over this config's modules.
    pub fn merge_modules_file(&mut self, path: &Path) -> Result<()> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| GameError::io(format!("cannot read module config '{}'", path.display()), e))?;
        for (name, config) in parse_configs(&source)? {
            match self.modules.get_mut(&name) {
                Some(earlier) => *earlier = std::mem::take(earlier).overlay(config),
                None => {
                    self.modules.insert(name, config);
                }
            }
        }
        Ok(())
    }

    pub fn unresolved(&self) -> Unresolved {
        if self.strict {
            Unresolved::Error
        } else {
            Unresolved::Preserve
        }
    }

    /// Stock modules with this config's entries registered on top.
    pub fn registry(&self) -> ModuleRegistry {
        let mut registry = ModuleRegistry::with_defaults();
        registry.register_all(self.modules.clone());
        registry
    }

    pub fn layer_table(&self) -> Result<LayerTable> {
        let mut table = LayerTable::default();
        if let Some(overrides) = &self.layers {
            table.apply_overrides(overrides)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config = BuildConfig::from_json("{}").unwrap();
        assert_eq!(config, BuildConfig::default());
        assert_eq!(config.unresolved(), Unresolved::Error);
    }

    #[test]
    fn modules_and_layers_merge_over_defaults() {
        let config = BuildConfig::from_json(
            r#"{
                "title": "Egg Shooter",
                "strict": false,
                "modules": {
                    "score": {"file": "game/score.js", "className": "Score", "dependencies": ["events"]},
                    "debug": {"required": true}
                },
                "layers": {"GAME": {"HUD": 70}}
            }"#,
        )
        .unwrap();
        assert_eq!(config.unresolved(), Unresolved::Preserve);

        let registry = config.registry();
        assert!(registry.get("debug").unwrap().required);
        assert_eq!(registry.get("debug").unwrap().class_name, "DebugOverlay");
        let order = registry.resolve_order().unwrap();
        assert_eq!(order.last().map(String::as_str), Some("debug"));
        assert!(order.iter().any(|n| n == "score"));

        assert_eq!(config.layer_table().unwrap().get("GAME.HUD").unwrap(), 70);
    }

    #[test]
    fn unknown_dependency_surfaces_on_resolve() {
        let config = BuildConfig::from_json(r#"{"modules": {"x": {"dependencies": ["nope"]}}}"#).unwrap();
        assert!(config.registry().resolve_order().is_err());
    }
}
