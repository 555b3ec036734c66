use std::collections::{HashMap, HashSet};

use crate::graph::NodeId;

/// Assigns one variable name per node for a single generation pass.
///
/// Names are `<prefix>_<n>` with a counter per prefix, so two `text` nodes
/// become `text_1` and `text_2`. A fresh `VariableNames` starts every pass
/// from scratch.
#[derive(Debug, Default)]
pub struct VariableNames {
    by_node: HashMap<NodeId, String>,
    counters: HashMap<String, u32>,
    issued: HashSet<String>,
}

impl VariableNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// The node's name, assigning the next free one on first request.
    pub fn assign(&mut self, node: NodeId, prefix: &str) -> &str {
        if !self.by_node.contains_key(&node) {
            let name = self.next_free(prefix);
            self.issued.insert(name.clone());
            self.by_node.insert(node, name);
        }
        &self.by_node[&node]
    }

    pub fn get(&self, node: NodeId) -> Option<&str> {
        self.by_node.get(&node).map(String::as_str)
    }

    fn next_free(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{prefix}_{counter}");
            if !self.issued.contains(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_prefix_counts_up() {
        let mut names = VariableNames::new();
        assert_eq!(names.assign(10, "text"), "text_1");
        assert_eq!(names.assign(11, "text"), "text_2");
        assert_eq!(names.assign(12, "sprite"), "sprite_1");
    }

    #[test]
    fn stable_per_node() {
        let mut names = VariableNames::new();
        let first = names.assign(5, "timer").to_string();
        assert_eq!(names.assign(5, "timer"), first);
        assert_eq!(names.get(5), Some("timer_1"));
        assert_eq!(names.get(6), None);
    }

    #[test]
    fn colliding_prefixes_stay_distinct() {
        let mut names = VariableNames::new();
        let a = names.assign(1, "a_1").to_string();
        let b = names.assign(2, "a").to_string();
        let c = names.assign(3, "a").to_string();
        assert_eq!(a, "a_1_1");
        assert_ne!(b, c);
        assert_ne!(a, b);
    }

    #[test]
    fn names_always_carry_a_counter() {
        let mut names = VariableNames::new();
        assert_eq!(names.assign(1, "app"), "app_1");
        assert_eq!(names.assign(2, "root"), "root_1");
    }
}
