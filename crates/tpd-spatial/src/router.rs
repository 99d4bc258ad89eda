//! Shortest-path routing for synthetic trajectories.
//!
//! Cost is edge length in metres.  Each vehicle turns length into expected
//! travel time with its own per-metre statistics (see `tpd-trajectory`).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tpd_core::{EdgeId, NodeId};

use crate::network::RoadNetwork;
use crate::{SpatialError, SpatialResult};

/// A path through the road network.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Intersections in travel order, origin first.  Never empty.
    pub vertices: Vec<NodeId>,
    /// `edges[i]` joins `vertices[i]` to `vertices[i + 1]`.
    pub edges: Vec<EdgeId>,
    pub length_m: f64,
}

impl Route {
    fn stay(at: NodeId) -> Self {
        Self { vertices: vec![at], edges: Vec::new(), length_m: 0.0 }
    }

    /// `true` if origin and destination coincide.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn origin(&self) -> NodeId {
        self.vertices[0]
    }

    pub fn destination(&self) -> NodeId {
        self.vertices[self.vertices.len() - 1]
    }
}

/// Pluggable routing engine.
pub trait Router: Send + Sync {
    /// Route from `from` to `to`.  `from == to` yields a trivial route.
    fn route(&self, network: &RoadNetwork, from: NodeId, to: NodeId) -> SpatialResult<Route>;
}

/// Dijkstra over the outgoing CSR adjacency, ties broken on `NodeId`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DijkstraRouter;

/// Min-heap entry: smaller distance first, then smaller node id.
#[derive(Clone, Copy, PartialEq)]
struct Visit {
    dist: f64,
    node: NodeId,
}

impl Eq for Visit {}

impl Ord for Visit {
    fn cmp(&self, other: &Self) -> Ordering {
        other.dist.total_cmp(&self.dist).then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Router for DijkstraRouter {
    fn route(&self, network: &RoadNetwork, from: NodeId, to: NodeId) -> SpatialResult<Route> {
        if let Some(&missing) = [from, to].iter().find(|&&n| !network.contains_node(n)) {
            return Err(SpatialError::NodeNotFound(missing));
        }
        if from == to {
            return Ok(Route::stay(from));
        }

        let mut best: Vec<Option<(f64, EdgeId)>> = vec![None; network.node_count()];
        let mut settled = vec![false; network.node_count()];
        let mut heap = BinaryHeap::from([Visit { dist: 0.0, node: from }]);

        while let Some(Visit { dist, node }) = heap.pop() {
            if std::mem::replace(&mut settled[node.index()], true) {
                continue;
            }
            if node == to {
                return Ok(walk_back(network, &best, from, to, dist));
            }
            for edge in network.out_edges(node) {
                let next = network.edge_to[edge.index()];
                if settled[next.index()] || next == from {
                    continue;
                }
                let d = dist + network.edge_length_m[edge.index()];
                if best[next.index()].is_none_or(|(known, _)| d < known) {
                    best[next.index()] = Some((d, edge));
                    heap.push(Visit { dist: d, node: next });
                }
            }
        }

        Err(SpatialError::NoRoute { from, to })
    }
}

fn walk_back(
    network: &RoadNetwork,
    best:    &[Option<(f64, EdgeId)>],
    from:    NodeId,
    to:      NodeId,
    length:  f64,
) -> Route {
    let mut vertices = vec![to];
    let mut edges = Vec::new();
    let mut here = to;
    while here != from {
        let Some((_, edge)) = best[here.index()] else { break };
        edges.push(edge);
        here = network.edge_from[edge.index()];
        vertices.push(here);
    }
    vertices.reverse();
    edges.reverse();
    Route { vertices, edges, length_m: length }
}
