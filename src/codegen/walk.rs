use std::collections::HashMap;

use crate::error::{ErrorKind, Result};
use crate::graph::{Graph, NodeId};

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first emission order: every node comes after the nodes feeding its
/// input slots (first link per slot only). Roots are taken in editor order.
pub(super) fn emission_order(graph: &Graph) -> Result<Vec<NodeId>> {
    let mut marks: HashMap<NodeId, Mark> = HashMap::new();
    let mut path: Vec<NodeId> = Vec::new();
    let mut order = Vec::with_capacity(graph.node_count());

    for node in graph.nodes() {
        visit(graph, node.id, &mut marks, &mut path, &mut order)?;
    }
    Ok(order)
}

fn visit(
    graph: &Graph,
    id: NodeId,
    marks: &mut HashMap<NodeId, Mark>,
    path: &mut Vec<NodeId>,
    order: &mut Vec<NodeId>,
) -> Result<()> {
    match marks.get(&id) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|n| *n == id).unwrap_or(0);
            let mut members = path[start..].to_vec();
            members.push(id);
            return Err(ErrorKind::GraphCycle { members }.into());
        }
        None => {}
    }

    marks.insert(id, Mark::Visiting);
    path.push(id);

    for slot in 0..graph.input_slot_count(id) {
        if let Some(link) = graph.upstream(id, slot) {
            visit(graph, link.origin_id, marks, path, order)?;
        }
    }

    path.pop();
    marks.insert(id, Mark::Done);
    order.push(id);
    Ok(())
}
