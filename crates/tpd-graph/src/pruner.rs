//! Reference-count pruning.
//!
//! Every parent entry of the destination starts a walk up the single-parent
//! chain to the root, bumping `reference_count` on each node visited.  Nodes
//! left at zero cannot reach the destination.  They are unlinked from their
//! parent's neighbor list first and then removed from the arena.

use tracing::debug;

use tpd_core::VehicleId;

use crate::{EncounterGraph, GraphError, GraphResult};

/// Outcome of one pruning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub kept:    usize,
    pub removed: usize,
}

/// Remove every node that lies on no root-to-destination path.
///
/// Counts are reset before the walk, so pruning an already-pruned graph
/// changes nothing.
pub fn prune(graph: &mut EncounterGraph) -> GraphResult<PruneReport> {
    let destination = graph.target();
    let root = graph.root();
    if !graph.contains(destination) {
        return Err(GraphError::DestinationMissing(destination));
    }

    for node in graph.nodes_mut() {
        node.reference_count = 0;
    }

    if destination == root {
        graph.require_mut(root)?.reference_count = 1;
    } else {
        let parents: Vec<VehicleId> = graph.require(destination)?.parents.iter().map(|e| e.peer).collect();
        if parents.is_empty() {
            return Err(GraphError::inconsistent(destination, "destination admitted without a parent"));
        }
        graph.require_mut(destination)?.reference_count = parents.len() as u32;

        // A chain longer than the node count must loop.
        let max_steps = graph.len();
        for start in parents {
            let mut cur = start;
            let mut steps = 0;
            loop {
                let node = graph.require_mut(cur)?;
                node.reference_count += 1;
                if cur == root {
                    break;
                }
                cur = match node.parents.as_slice() {
                    [only] => only.peer,
                    [] => return Err(GraphError::inconsistent(cur, "parent chain ends before the root")),
                    _ => return Err(GraphError::inconsistent(cur, "non-destination node has several parents")),
                };
                steps += 1;
                if steps > max_steps {
                    return Err(GraphError::inconsistent(start, "parent chain does not reach the root"));
                }
            }
        }
    }

    let dead: Vec<VehicleId> = graph
        .nodes()
        .filter(|n| n.reference_count == 0)
        .map(|n| n.vehicle)
        .collect();

    // Sever edges before freeing nodes.
    for &v in &dead {
        let parents: Vec<VehicleId> = graph.require(v)?.parents.iter().map(|e| e.peer).collect();
        for p in parents {
            if let Some(parent) = graph.node_mut(p) {
                parent.neighbors.retain(|e| e.peer != v);
            }
        }
    }
    for &v in &dead {
        graph.remove(v);
    }
    graph.compact_order();

    let report = PruneReport { kept: graph.len(), removed: dead.len() };
    debug!(kept = report.kept, removed = report.removed, "encounter graph pruned");
    Ok(report)
}
