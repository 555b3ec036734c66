//! Serialized node graph as saved by the browser editor.
//!
//! The editor's graph library owns node identity; this side only reads nodes
//! and links. Links arrive either as the compact
//! `[id, origin_id, origin_slot, target_id, target_slot, type]` array or as an
//! object with the same field names.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, GameError, Result};

pub type NodeId = u64;
pub type LinkId = u64;

/// A node graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "GraphRepr", into = "GraphRepr")]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
    links: IndexMap<LinkId, Link>,
}

/// One node as read from the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub inputs: Vec<InputSlot>,
    #[serde(default)]
    pub outputs: Vec<OutputSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSlot {
    pub name: String,
    #[serde(rename = "type", default)]
    pub slot_type: Value,
    #[serde(default)]
    pub link: Option<LinkId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSlot {
    pub name: String,
    #[serde(rename = "type", default)]
    pub slot_type: Value,
    #[serde(default)]
    pub links: Option<Vec<LinkId>>,
}

/// A directed slot-to-slot connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LinkRepr")]
pub struct Link {
    pub id: LinkId,
    pub origin_id: NodeId,
    pub origin_slot: usize,
    pub target_id: NodeId,
    pub target_slot: usize,
    #[serde(rename = "type")]
    pub link_type: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LinkRepr {
    Compact(LinkId, NodeId, usize, NodeId, usize, Value),
    Object {
        id: LinkId,
        origin_id: NodeId,
        origin_slot: usize,
        target_id: NodeId,
        target_slot: usize,
        #[serde(rename = "type", default)]
        link_type: Value,
    },
}

impl From<LinkRepr> for Link {
    fn from(repr: LinkRepr) -> Self {
        match repr {
            LinkRepr::Compact(id, origin_id, origin_slot, target_id, target_slot, link_type)
            | LinkRepr::Object {
                id,
                origin_id,
                origin_slot,
                target_id,
                target_slot,
                link_type,
            } => Link {
                id,
                origin_id,
                origin_slot,
                target_id,
                target_slot,
                link_type,
            },
        }
    }
}

#[derive(Serialize, Deserialize)]
struct GraphRepr {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    links: Vec<Link>,
}

impl From<GraphRepr> for Graph {
    fn from(repr: GraphRepr) -> Self {
        Graph {
            nodes: repr.nodes.into_iter().map(|n| (n.id, n)).collect(),
            links: repr.links.into_iter().map(|l| (l.id, l)).collect(),
        }
    }
}

impl From<Graph> for GraphRepr {
    fn from(graph: Graph) -> Self {
        GraphRepr {
            nodes: graph.nodes.into_values().collect(),
            links: graph.links.into_values().collect(),
        }
    }
}

impl Node {
    /// Title for display, falling back to the type tag.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.node_type
        } else {
            &self.title
        }
    }
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    /// Parse and validate a serialized graph.
    pub fn from_json(source: &str) -> Result<Self> {
        let graph: Graph = serde_json::from_str(source)?;
        graph.validate()?;
        Ok(graph)
    }

    /// Build from an already-decoded JSON value (preview messages carry one).
    pub fn from_value(value: Value) -> Result<Self> {
        let graph: Graph = serde_json::from_value(value)?;
        graph.validate()?;
        Ok(graph)
    }

    /// Every link must join two nodes that exist.
    pub fn validate(&self) -> Result<()> {
        for link in self.links.values() {
            for end in [link.origin_id, link.target_id] {
                if !self.nodes.contains_key(&end) {
                    return Err(ErrorKind::DanglingLink {
                        link: link.id,
                        node: end,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Add a node; a node with the same id is replaced in place.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Connect `origin:slot` to `target:slot`, recording the link on both
    /// nodes the way the editor does.
    pub fn connect(
        &mut self,
        origin_id: NodeId,
        origin_slot: usize,
        target_id: NodeId,
        target_slot: usize,
    ) -> Result<LinkId> {
        for end in [origin_id, target_id] {
            if !self.nodes.contains_key(&end) {
                return Err(GameError::message(format!("cannot link missing node #{end}")));
            }
        }
        let id = self.links.keys().max().map_or(1, |max| max + 1);
        self.links.insert(
            id,
            Link {
                id,
                origin_id,
                origin_slot,
                target_id,
                target_slot,
                link_type: Value::Null,
            },
        );
        if let Some(origin) = self.nodes.get_mut(&origin_id) {
            if let Some(out) = origin.outputs.get_mut(origin_slot) {
                out.links.get_or_insert_with(Vec::new).push(id);
            }
        }
        if let Some(target) = self.nodes.get_mut(&target_id) {
            if let Some(input) = target.inputs.get_mut(target_slot) {
                input.link.get_or_insert(id);
            }
        }
        Ok(id)
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// All nodes, in editor order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All links, in editor order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Every link feeding `target_id:slot`, in discovery order.
    pub fn links_into(&self, target_id: NodeId, slot: usize) -> Vec<&Link> {
        let mut found: Vec<&Link> = Vec::new();
        // The slot's own back-reference is discovered first.
        if let Some(link) = self
            .node(target_id)
            .and_then(|n| n.inputs.get(slot))
            .and_then(|input| input.link)
            .and_then(|id| self.links.get(&id))
            .filter(|l| l.target_id == target_id && l.target_slot == slot)
        {
            found.push(link);
        }
        for link in self.links.values() {
            if link.target_id == target_id
                && link.target_slot == slot
                && !found.iter().any(|f| f.id == link.id)
            {
                found.push(link);
            }
        }
        found
    }

    /// The link feeding an input slot. Fan-in is not resolved: the first
    /// discovered link wins.
    pub fn upstream(&self, target_id: NodeId, slot: usize) -> Option<&Link> {
        self.links_into(target_id, slot).into_iter().next()
    }

    /// Number of input slots a node has, counting slots only links mention.
    pub fn input_slot_count(&self, id: NodeId) -> usize {
        let declared = self.node(id).map_or(0, |n| n.inputs.len());
        let linked = self
            .links
            .values()
            .filter(|l| l.target_id == id)
            .map(|l| l.target_slot + 1)
            .max()
            .unwrap_or(0);
        declared.max(linked)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_NODES: &str = r#"{
        "last_node_id": 2,
        "last_link_id": 1,
        "nodes": [
            {"id": 1, "type": "game/stage", "title": "Stage",
             "outputs": [{"name": "stage", "type": "container", "links": [1]}],
             "properties": {"width": 640}},
            {"id": 2, "type": "game/text",
             "inputs": [{"name": "parent", "type": "container", "link": 1}],
             "properties": {"text": "Hi"}}
        ],
        "links": [[1, 1, 0, 2, 0, "container"]],
        "groups": [],
        "version": 0.4
    }"#;

    #[test]
    fn parse_editor_format() {
        let graph = Graph::from_json(TWO_NODES).expect("parse failed");
        assert_eq!(graph.node_count(), 2);
        let link = graph.upstream(2, 0).expect("text should be linked");
        assert_eq!(link.origin_id, 1);
        assert_eq!(link.origin_slot, 0);
        assert_eq!(graph.node(2).unwrap().display_title(), "game/text");
        assert_eq!(graph.node(1).unwrap().properties["width"], 640);
    }

    #[test]
    fn parse_object_links() {
        let src = r#"{"nodes": [{"id": 4, "type": "a"}, {"id": 5, "type": "b"}],
            "links": [{"id": 9, "origin_id": 4, "origin_slot": 0, "target_id": 5, "target_slot": 1}]}"#;
        let graph = Graph::from_json(src).expect("parse failed");
        assert_eq!(graph.upstream(5, 1).map(|l| l.id), Some(9));
        assert_eq!(graph.input_slot_count(5), 2);
    }

    #[test]
    fn dangling_link_rejected() {
        let src = r#"{"nodes": [{"id": 1, "type": "a"}], "links": [[3, 1, 0, 2, 0, null]]}"#;
        let err = Graph::from_json(src).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DanglingLink { link: 3, node: 2 }));
    }

    #[test]
    fn fan_in_uses_first_discovered_link() {
        let src = r#"{"nodes": [
                {"id": 1, "type": "a"}, {"id": 2, "type": "a"},
                {"id": 3, "type": "b", "inputs": [{"name": "in", "link": 11}]}
            ],
            "links": [[10, 1, 0, 3, 0, null], [11, 2, 0, 3, 0, null]]}"#;
        let graph = Graph::from_json(src).expect("parse failed");
        assert_eq!(graph.links_into(3, 0).len(), 2);
        // The slot's own back-reference outranks list order.
        assert_eq!(graph.upstream(3, 0).map(|l| l.origin_id), Some(2));
    }

    #[test]
    fn connect_records_both_ends() {
        let mut graph = Graph::new();
        for (id, name) in [(1, "out"), (2, "in")] {
            graph.add_node(Node {
                id,
                node_type: "x".into(),
                title: String::new(),
                properties: Map::new(),
                inputs: vec![InputSlot { name: name.into(), slot_type: Value::Null, link: None }],
                outputs: vec![OutputSlot { name: name.into(), slot_type: Value::Null, links: None }],
            });
        }
        let link = graph.connect(1, 0, 2, 0).expect("connect failed");
        assert_eq!(graph.node(2).unwrap().inputs[0].link, Some(link));
        assert_eq!(graph.node(1).unwrap().outputs[0].links, Some(vec![link]));
        assert!(graph.connect(1, 0, 99, 0).is_err());
    }

    #[test]
    fn round_trips_through_serde() {
        let graph = Graph::from_json(TWO_NODES).expect("parse failed");
        let value = serde_json::to_value(&graph).expect("serialize failed");
        let back = Graph::from_value(value).expect("reparse failed");
        assert_eq!(back.node_count(), 2);
        assert_eq!(back.upstream(2, 0).map(|l| l.origin_id), Some(1));
    }
}
