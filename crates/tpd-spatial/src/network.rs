//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format twice: once for
//! outgoing edges and once for incoming edges.  Given a `NodeId n`:
//!
//! ```text
//! outgoing: EdgeId( node_out_start[n] .. node_out_start[n+1] )
//! incoming: in_edges[ node_in_start[n] .. node_in_start[n+1] ]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_length_m`) are sorted by
//! source node and indexed by `EdgeId`.  The incoming view is what lets the
//! next-carrier selector fan out over *every* edge touching an intersection,
//! in both directions.
//!
//! A road segment is **two-way** when both `a → b` and `b → a` exist; the
//! selector searches both directional edges of such a segment.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps planar points to the nearest `NodeId`.  Used
//! when trajectories are loaded from raw coordinates.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use tpd_core::{EdgeId, NodeId, Point};

use crate::{SpatialError, SpatialResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road graph in CSR format plus a spatial index for node snapping.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`RoadNetworkBuilder`].
pub struct RoadNetwork {
    /// Planar position of each intersection.  Indexed by `NodeId`.
    pub node_pos: Vec<Point>,

    /// CSR row pointer for outgoing edges.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// CSR row pointer into `in_edges`.  Length = `node_count + 1`.
    pub node_in_start: Vec<u32>,

    /// Incoming `EdgeId`s grouped by destination node.
    pub in_edges: Vec<EdgeId>,

    /// Source node of each edge.
    pub edge_from: Vec<NodeId>,

    /// Destination node of each edge.
    pub edge_to: Vec<NodeId>,

    /// Length of each edge in metres.
    pub edge_length_m: Vec<f64>,

    spatial_idx: RTree<NodeEntry>,
}

impl RoadNetwork {
    /// Construct an empty network with no nodes or edges.
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// Iterator over the `EdgeId`s of all incoming edges to `node`.
    #[inline]
    pub fn in_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_in_start[node.index()] as usize;
        let end   = self.node_in_start[node.index() + 1] as usize;
        self.in_edges[start..end].iter().copied()
    }

    /// Every edge touching `node`: outgoing first, then incoming, each in
    /// ascending `EdgeId` order.
    pub fn incident_edges(&self, node: NodeId) -> Vec<EdgeId> {
        self.out_edges(node).chain(self.in_edges(node)).collect()
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// The directed edge `from → to`, if the network has one.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        if !self.contains_node(from) {
            return None;
        }
        self.out_edges(from).find(|e| self.edge_to[e.index()] == to)
    }

    /// Like [`edge_between`](Self::edge_between) but reports a missing edge
    /// as an error.
    pub fn require_edge(&self, from: NodeId, to: NodeId) -> SpatialResult<EdgeId> {
        self.edge_between(from, to).ok_or(SpatialError::NoEdge { from, to })
    }

    /// The opposite-direction edge of a two-way segment, or `None` for a
    /// one-way road.
    pub fn reverse_edge(&self, edge: EdgeId) -> Option<EdgeId> {
        self.edge_between(self.edge_to[edge.index()], self.edge_from[edge.index()])
    }

    #[inline]
    pub fn is_two_way(&self, edge: EdgeId) -> bool {
        self.reverse_edge(edge).is_some()
    }

    /// Planar point `offset_m` metres along `edge` from its tail.
    pub fn point_on_edge(&self, edge: EdgeId, offset_m: f64) -> Point {
        let from   = self.node_pos[self.edge_from[edge.index()].index()];
        let to     = self.node_pos[self.edge_to[edge.index()].index()];
        let length = self.edge_length_m[edge.index()];
        if length <= 0.0 {
            return from;
        }
        from.lerp(to, offset_m / length)
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Return the `NodeId` of the nearest intersection to `pos`.
    ///
    /// Returns `None` only if the network has no nodes.
    pub fn snap_to_node(&self, pos: Point) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&pos.as_array())
            .map(|e| e.id)
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use tpd_core::Point;
/// use tpd_spatial::RoadNetworkBuilder;
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_node(Point::new(0.0, 0.0));
/// let c = b.add_node(Point::new(1_200.0, 0.0));
/// b.add_road(a, c, 1_200.0);
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // two-way
/// ```
pub struct RoadNetworkBuilder {
    nodes:     Vec<Point>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:     NodeId,
    to:       NodeId,
    length_m: f64,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    /// Add an intersection and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: Point) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a **one-way** edge from `from` to `to`.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length_m: f64) {
        self.raw_edges.push(RawEdge { from, to, length_m });
    }

    /// Add edges in **both directions** for a two-way road segment.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length_m: f64) {
        self.add_directed_edge(a, b, length_m);
        self.add_directed_edge(b, a, length_m);
    }

    /// Two-way road whose length is the straight-line distance between the
    /// two intersections.
    pub fn add_straight_road(&mut self, a: NodeId, b: NodeId) {
        let length = self.nodes[a.index()].distance(self.nodes[b.index()]);
        self.add_road(a, b, length);
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadNetwork`].
    ///
    /// Time complexity: O(E log E) for edge sort + O(N log N) for R-tree bulk
    /// load, where N = nodes, E = edges.
    pub fn build(self) -> RoadNetwork {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        // Stable sort keeps insertion order among a node's outgoing edges.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_from:     Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to:       Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_length_m: Vec<f64>    = raw.iter().map(|e| e.length_m).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        let mut node_in_start  = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
            node_in_start[e.to.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
            node_in_start[i]  += node_in_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        // Scatter edges into the incoming CSR.  Edges are visited in EdgeId
        // order, so each node's incoming slice ends up ascending.
        let mut cursor   = node_in_start.clone();
        let mut in_edges = vec![EdgeId::INVALID; edge_count];
        for (i, to) in edge_to.iter().enumerate() {
            let slot = &mut cursor[to.index()];
            in_edges[*slot as usize] = EdgeId(i as u32);
            *slot += 1;
        }

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry { point: pos.as_array(), id: NodeId(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        RoadNetwork {
            node_pos: self.nodes,
            node_out_start,
            node_in_start,
            in_edges,
            edge_from,
            edge_to,
            edge_length_m,
            spatial_idx,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
