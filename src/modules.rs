//! Module registry: decides the order the runtime shell loads game
//! subsystems in.
//!
//! Modules declare required and optional dependencies plus a priority. The
//! resolved order places every module after all of its dependencies; among
//! modules that are ready at the same time the lowest priority goes first and
//! ties keep registration order.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, GameError, Result};

/// A registered module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub name: String,
    pub file: String,
    pub class_name: String,
    pub dependencies: Vec<String>,
    pub optional_dependencies: Vec<String>,
    pub priority: i32,
    pub required: bool,
}

/// A partial descriptor as written in configuration. Absent fields keep the
/// value from an earlier registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleConfig {
    pub file: Option<String>,
    pub class_name: Option<String>,
    pub dependencies: Option<Vec<String>>,
    pub optional_dependencies: Option<Vec<String>>,
    pub priority: Option<i32>,
    pub required: Option<bool>,
}

/// One entry of the resolved load plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStep {
    pub name: String,
    pub file: String,
    pub class_name: String,
    pub required: bool,
}

/// Module configuration file: either a bare `name → config` map or the same
/// map under a `modules` key.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigFile {
    Wrapped { modules: IndexMap<String, ModuleConfig> },
    Bare(IndexMap<String, ModuleConfig>),
}

/// Name-keyed module table. Registration order is the order of first
/// registration.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: IndexMap<String, ModuleDescriptor>,
}

/// Parse a module configuration file, either shape.
pub fn parse_configs(source: &str) -> Result<IndexMap<String, ModuleConfig>> {
    Ok(match serde_json::from_str(source)? {
        ConfigFile::Wrapped { modules } => modules,
        ConfigFile::Bare(map) => map,
    })
}

impl ModuleConfig {
    pub fn new(file: &str, class_name: &str) -> Self {
        Self {
            file: Some(file.to_string()),
            class_name: Some(class_name.to_string()),
            ..Self::default()
        }
    }

    /// Fields set in `newer` win; the rest are kept.
    pub fn overlay(self, newer: ModuleConfig) -> Self {
        Self {
            file: newer.file.or(self.file),
            class_name: newer.class_name.or(self.class_name),
            dependencies: newer.dependencies.or(self.dependencies),
            optional_dependencies: newer.optional_dependencies.or(self.optional_dependencies),
            priority: newer.priority.or(self.priority),
            required: newer.required.or(self.required),
        }
    }

    pub fn depends_on(mut self, deps: &[&str]) -> Self {
        self.dependencies = Some(deps.iter().map(|d| d.to_string()).collect());
        self
    }

    pub fn optionally_on(mut self, deps: &[&str]) -> Self {
        self.optional_dependencies = Some(deps.iter().map(|d| d.to_string()).collect());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock game subsystems shipped with the runtime shell.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("events", ModuleConfig::new("modules/events.js", "EventBus").priority(0).required(true));
        registry.register(
            "assets",
            ModuleConfig::new("modules/assets.js", "AssetLoader")
                .depends_on(&["events"])
                .priority(1)
                .required(true),
        );
        registry.register(
            "input",
            ModuleConfig::new("modules/input.js", "InputManager")
                .depends_on(&["events"])
                .priority(2)
                .required(true),
        );
        registry.register(
            "audio",
            ModuleConfig::new("modules/audio.js", "AudioManager")
                .depends_on(&["events"])
                .optionally_on(&["assets"])
                .priority(3)
                .required(false),
        );
        registry.register(
            "debug",
            ModuleConfig::new("modules/debug.js", "DebugOverlay")
                .depends_on(&["events"])
                .optionally_on(&["input"])
                .priority(100)
                .required(false),
        );
        registry
    }

    /// Merge a config into the table. Fields present in `config` overwrite,
    /// absent ones keep their previous value (shallow merge).
    pub fn register(&mut self, name: &str, config: ModuleConfig) {
        let entry = self
            .modules
            .entry(name.to_string())
            .or_insert_with(|| ModuleDescriptor {
                name: name.to_string(),
                file: format!("modules/{name}.js"),
                class_name: name.to_string(),
                dependencies: Vec::new(),
                optional_dependencies: Vec::new(),
                priority: 0,
                required: true,
            });

        if let Some(file) = config.file {
            entry.file = file;
        }
        if let Some(class_name) = config.class_name {
            entry.class_name = class_name;
        }
        if let Some(deps) = config.dependencies {
            entry.dependencies = deps;
        }
        if let Some(deps) = config.optional_dependencies {
            entry.optional_dependencies = deps;
        }
        if let Some(priority) = config.priority {
            entry.priority = priority;
        }
        if let Some(required) = config.required {
            entry.required = required;
        }
        tracing::debug!(module = name, "registered module");
    }

    /// Register every entry of a map, in map order.
    pub fn register_all(&mut self, configs: IndexMap<String, ModuleConfig>) {
        for (name, config) in configs {
            self.register(&name, config);
        }
    }

    /// Register every module from a JSON configuration string.
    pub fn register_json(&mut self, source: &str) -> Result<()> {
        self.register_all(parse_configs(source)?);
        Ok(())
    }

    /// Register every module from a JSON configuration file.
    pub fn register_file(&mut self, path: &Path) -> Result<()> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| GameError::io(format!("cannot read module config '{}'", path.display()), e))?;
        self.register_json(&source)
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Registered modules, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values()
    }

    /// Dependencies that constrain ordering: all required ones plus the
    /// optional ones that are registered.
    fn ordering_deps<'a>(&'a self, module: &'a ModuleDescriptor) -> impl Iterator<Item = &'a str> + 'a {
        module.dependencies.iter().map(String::as_str).chain(
            module
                .optional_dependencies
                .iter()
                .map(String::as_str)
                .filter(|d| self.modules.contains_key(*d)),
        )
    }

    /// Linear load order: every module after all its dependencies.
    pub fn resolve_order(&self) -> Result<Vec<String>> {
        for module in self.modules.values() {
            if let Some(missing) = module.dependencies.iter().find(|d| !self.modules.contains_key(*d)) {
                return Err(ErrorKind::MissingDependency {
                    module: module.name.clone(),
                    dependency: missing.clone(),
                }
                .into());
            }
        }

        let index: HashMap<&str, usize> = self
            .modules
            .keys()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let descriptors: Vec<&ModuleDescriptor> = self.modules.values().collect();

        let mut pending = vec![0usize; descriptors.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); descriptors.len()];
        for (i, module) in descriptors.iter().enumerate() {
            let mut seen = BTreeSet::new();
            for dep in self.ordering_deps(module) {
                let d = index[dep];
                if seen.insert(d) {
                    pending[i] += 1;
                    dependents[d].push(i);
                }
            }
        }

        // Ready queue keyed by (priority, registration index).
        let mut ready: BTreeSet<(i32, usize)> = pending
            .iter()
            .enumerate()
            .filter(|(_, n)| **n == 0)
            .map(|(i, _)| (descriptors[i].priority, i))
            .collect();

        let mut order = Vec::with_capacity(descriptors.len());
        while let Some((_, i)) = ready.pop_first() {
            order.push(descriptors[i].name.clone());
            for &dependent in &dependents[i] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.insert((descriptors[dependent].priority, dependent));
                }
            }
        }

        if order.len() < descriptors.len() {
            let stuck: Vec<usize> = (0..descriptors.len()).filter(|i| pending[*i] > 0).collect();
            return Err(ErrorKind::DependencyCycle {
                members: self.find_cycle(&descriptors, &index, &pending, stuck[0]),
            }
            .into());
        }

        tracing::debug!(order = ?order, "resolved module order");
        Ok(order)
    }

    /// Walk unresolved dependencies from a stuck module until one repeats.
    /// Every stuck module has at least one stuck dependency, so the walk
    /// always closes a loop.
    fn find_cycle(
        &self,
        descriptors: &[&ModuleDescriptor],
        index: &HashMap<&str, usize>,
        pending: &[usize],
        start: usize,
    ) -> Vec<String> {
        let mut path: Vec<usize> = Vec::new();
        let mut current = start;
        loop {
            if let Some(pos) = path.iter().position(|p| *p == current) {
                let mut members: Vec<String> = path[pos..].iter().map(|i| descriptors[*i].name.clone()).collect();
                members.push(descriptors[current].name.clone());
                return members;
            }
            path.push(current);
            let next = self
                .ordering_deps(descriptors[current])
                .map(|d| index[d])
                .find(|d| pending[*d] > 0);
            match next {
                Some(n) => current = n,
                None => return path.iter().map(|i| descriptors[*i].name.clone()).collect(),
            }
        }
    }

    /// The resolved order with the details the runtime loader needs.
    pub fn load_plan(&self) -> Result<Vec<LoadStep>> {
        let order = self.resolve_order()?;
        Ok(order
            .iter()
            .filter_map(|name| self.modules.get(name))
            .map(|m| LoadStep {
                name: m.name.clone(),
                file: m.file.clone(),
                class_name: m.class_name.clone(),
                required: m.required,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(deps: &[&str], priority: i32) -> ModuleConfig {
        ModuleConfig::default().depends_on(deps).priority(priority)
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap_or_else(|| panic!("{name} missing from order"))
    }

    #[test]
    fn dependencies_precede_dependents() {
        let mut reg = ModuleRegistry::new();
        reg.register("scene", config(&["assets", "input"], 0));
        reg.register("assets", config(&["events"], 5));
        reg.register("input", config(&["events"], 1));
        reg.register("events", config(&[], 9));

        let order = reg.resolve_order().unwrap();
        assert_eq!(order, vec!["events", "input", "assets", "scene"]);
        for module in reg.iter() {
            for dep in &module.dependencies {
                assert!(position(&order, dep) < position(&order, &module.name));
            }
        }
    }

    #[test]
    fn equal_priority_keeps_registration_order() {
        let mut reg = ModuleRegistry::new();
        for name in ["c", "a", "b"] {
            reg.register(name, config(&[], 1));
        }
        assert_eq!(reg.resolve_order().unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn re_registration_merges_and_keeps_one_entry() {
        let mut reg = ModuleRegistry::new();
        reg.register("base", config(&[], 0));
        reg.register("extra", config(&[], 0));
        reg.register("ui", ModuleConfig::new("ui.js", "Ui").depends_on(&["base"]).priority(4));
        reg.register("ui", ModuleConfig::default().depends_on(&["extra"]));

        let ui = reg.get("ui").unwrap();
        assert_eq!(ui.dependencies, vec!["extra"]);
        assert_eq!(ui.file, "ui.js");
        assert_eq!(ui.priority, 4);

        let order = reg.resolve_order().unwrap();
        assert_eq!(order.iter().filter(|n| *n == "ui").count(), 1);
        assert!(position(&order, "extra") < position(&order, "ui"));
    }

    #[test]
    fn missing_required_dependency_is_an_error() {
        let mut reg = ModuleRegistry::new();
        reg.register("physics", config(&["math"], 0));
        let err = reg.resolve_order().unwrap_err();
        match err.kind {
            ErrorKind::MissingDependency { module, dependency } => {
                assert_eq!(module, "physics");
                assert_eq!(dependency, "math");
            }
            other => panic!("expected missing dependency, got {other:?}"),
        }
    }

    #[test]
    fn optional_dependencies_order_only_when_present() {
        let mut reg = ModuleRegistry::new();
        reg.register("audio", ModuleConfig::default().optionally_on(&["assets", "missing"]).priority(0));
        reg.register("assets", config(&[], 5));
        assert_eq!(reg.resolve_order().unwrap(), vec!["assets", "audio"]);
    }

    #[test]
    fn two_module_cycle_reported() {
        let mut reg = ModuleRegistry::new();
        reg.register("a", config(&["b"], 0));
        reg.register("b", config(&["a"], 0));
        let err = reg.resolve_order().unwrap_err();
        match err.kind {
            ErrorKind::DependencyCycle { members } => assert_eq!(members, vec!["a", "b", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn cycle_behind_acyclic_prefix_names_only_members() {
        let mut reg = ModuleRegistry::new();
        reg.register("root", config(&[], 0));
        reg.register("top", config(&["x"], 0));
        reg.register("x", config(&["root", "y"], 0));
        reg.register("y", config(&["x"], 0));
        let err = reg.resolve_order().unwrap_err();
        match err.kind {
            ErrorKind::DependencyCycle { members } => assert_eq!(members, vec!["x", "y", "x"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut reg = ModuleRegistry::new();
        reg.register("loop", config(&["loop"], 0));
        assert!(matches!(
            reg.resolve_order().unwrap_err().kind,
            ErrorKind::DependencyCycle { .. }
        ));
    }

    #[test]
    fn json_config_both_shapes() {
        let mut reg = ModuleRegistry::new();
        reg.register_json(
            r#"{"modules": {
                "events": {"file": "core/events.js", "className": "EventBus", "priority": 0},
                "score": {"file": "game/score.js", "dependencies": ["events"], "required": false}
            }}"#,
        )
        .unwrap();
        reg.register_json(r#"{"score": {"priority": 7}}"#).unwrap();

        let score = reg.get("score").unwrap();
        assert_eq!(score.priority, 7);
        assert!(!score.required);
        assert_eq!(reg.get("events").unwrap().class_name, "EventBus");

        let plan = reg.load_plan().unwrap();
        assert_eq!(plan[0].file, "core/events.js");
        assert_eq!(plan[1].name, "score");
    }

    #[test]
    fn defaults_resolve() {
        let reg = ModuleRegistry::with_defaults();
        let order = reg.resolve_order().unwrap();
        assert_eq!(order, vec!["events", "assets", "input", "audio", "debug"]);
    }

    #[test]
    fn many_acyclic_layouts_respect_dependencies() {
        // Chain-of-layers registries registered in reverse, with priorities
        // that fight the dependency direction.
        for width in 1..5 {
            let mut reg = ModuleRegistry::new();
            for layer in (0..4).rev() {
                for k in 0..width {
                    let deps: Vec<String> = if layer == 0 {
                        Vec::new()
                    } else {
                        (0..width).map(|j| format!("m{}_{j}", layer - 1)).collect()
                    };
                    let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
                    reg.register(&format!("m{layer}_{k}"), config(&deps, -(layer as i32)));
                }
            }
            let order = reg.resolve_order().unwrap();
            assert_eq!(order.len(), reg.len());
            for module in reg.iter() {
                for dep in &module.dependencies {
                    assert!(position(&order, dep) < position(&order, &module.name));
                }
            }
        }
    }
}
