//! Predicted paths: path nodes, the cursor, and per-edge occupancy windows.

use tpd_core::{NodeId, SimTime, VehicleId};
use tpd_spatial::RoadNetwork;

use crate::{TrajectoryError, TrajectoryResult, TravelTimeStats};

/// One predicted waypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathNode {
    pub vertex: NodeId,
    /// Expected arrival time at `vertex`.
    pub arrival_time: SimTime,
    /// Length in metres of the edge to the next path node (0 for the last).
    pub edge_length: f64,
}

/// A vehicle's occupancy of one trajectory edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryEdge {
    /// Index of the tail path node within the trajectory.
    pub index: usize,
    pub tail: NodeId,
    pub head: NodeId,
    /// Expected arrival at `tail`.
    pub enter: SimTime,
    /// Expected arrival at `head`.
    pub exit: SimTime,
    pub length: f64,
    /// Path length from the cursor vertex to `tail`.
    pub distance_to_tail: f64,
}

impl TrajectoryEdge {
    #[inline]
    pub fn travel_time(&self) -> f64 {
        self.exit - self.enter
    }

    /// Expected distance from `tail` at time `t`, assuming constant speed
    /// over the edge.  Clamped to `[0, length]`.
    pub fn offset_at(&self, t: SimTime) -> f64 {
        let tt = self.travel_time();
        if tt <= 0.0 {
            return if t >= self.exit { self.length } else { 0.0 };
        }
        ((t - self.enter) / tt).clamp(0.0, 1.0) * self.length
    }

    /// `true` when this edge and `other` cover the same road segment in
    /// opposite directions.
    #[inline]
    pub fn is_reverse_of(&self, other: &TrajectoryEdge) -> bool {
        self.tail == other.head && self.head == other.tail
    }

    #[inline]
    pub fn is_same_segment(&self, other: &TrajectoryEdge) -> bool {
        self.tail == other.tail && self.head == other.head
    }
}

/// Where a vehicle is expected to be at a given instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrajectoryPosition {
    /// Waiting at (or parked beyond the end of the path at) an intersection.
    AtVertex(NodeId),
    /// Travelling `tail → head`, `offset` metres past `tail`.
    OnEdge { tail: NodeId, head: NodeId, offset: f64 },
}

/// An ordered, finite sequence of [`PathNode`]s plus a live cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    nodes:  Vec<PathNode>,
    cursor: usize,
}

impl Trajectory {
    /// Build a trajectory, validating that it is non-empty, that arrival
    /// times are finite and non-decreasing, and that edge lengths are
    /// non-negative.
    pub fn new(vehicle: VehicleId, nodes: Vec<PathNode>) -> TrajectoryResult<Self> {
        let invalid = |reason: String| TrajectoryError::Invalid { vehicle, reason };

        if nodes.is_empty() {
            return Err(invalid("trajectory has no path nodes".into()));
        }
        for (i, node) in nodes.iter().enumerate() {
            if !node.arrival_time.secs().is_finite() {
                return Err(invalid(format!("path node {i} has a non-finite arrival time")));
            }
            if !(node.edge_length >= 0.0) {
                return Err(invalid(format!("path node {i} has a negative edge length")));
            }
        }
        if let Some(i) = nodes.windows(2).position(|w| w[1].arrival_time < w[0].arrival_time) {
            return Err(invalid(format!(
                "arrival time decreases between path nodes {i} and {}",
                i + 1
            )));
        }
        Ok(Self { nodes, cursor: 0 })
    }

    /// A vehicle parked at `vertex` from `at` onwards.
    pub fn stationary(vertex: NodeId, at: SimTime) -> Self {
        Self {
            nodes:  vec![PathNode { vertex, arrival_time: at, edge_length: 0.0 }],
            cursor: 0,
        }
    }

    /// Predict arrival times along `vertices` on `network`, departing the
    /// first vertex at `depart` with the vehicle's mean per-metre travel time.
    pub fn from_vertices(
        vehicle:  VehicleId,
        network:  &RoadNetwork,
        vertices: &[NodeId],
        depart:   SimTime,
        stats:    &TravelTimeStats,
    ) -> TrajectoryResult<Self> {
        let mut nodes = Vec::with_capacity(vertices.len());
        let mut t = depart;
        for (i, &vertex) in vertices.iter().enumerate() {
            let edge_length = match vertices.get(i + 1) {
                Some(&next) => {
                    let e = network.require_edge(vertex, next)?;
                    network.edge_length_m[e.index()]
                }
                None => 0.0,
            };
            nodes.push(PathNode { vertex, arrival_time: t, edge_length });
            t = t + stats.travel_time(edge_length);
        }
        Self::new(vehicle, nodes)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Path nodes from the cursor onwards.
    pub fn remaining(&self) -> &[PathNode] {
        &self.nodes[self.cursor..]
    }

    pub fn start_time(&self) -> SimTime {
        self.nodes[0].arrival_time
    }

    pub fn end_time(&self) -> SimTime {
        self.nodes[self.nodes.len() - 1].arrival_time
    }

    /// The vertex of the last path node.
    pub fn final_vertex(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1].vertex
    }

    /// The edge the cursor currently sits on, or `None` once the vehicle has
    /// reached its final path node.
    pub fn current_edge(&self) -> Option<TrajectoryEdge> {
        self.edges().next()
    }

    /// Remaining edges in travel order, starting at the cursor.
    pub fn edges(&self) -> impl Iterator<Item = TrajectoryEdge> + '_ {
        let mut distance = 0.0;
        (self.cursor..self.nodes.len().saturating_sub(1)).map(move |i| {
            let tail = self.nodes[i];
            let head = self.nodes[i + 1];
            let edge = TrajectoryEdge {
                index: i,
                tail: tail.vertex,
                head: head.vertex,
                enter: tail.arrival_time,
                exit: head.arrival_time,
                length: tail.edge_length,
                distance_to_tail: distance,
            };
            distance += tail.edge_length;
            edge
        })
    }

    // ── Cursor ────────────────────────────────────────────────────────────

    /// Move the cursor to the last path node reached by `now`.  The cursor
    /// never moves backwards.  Returns `true` if it moved.
    pub fn advance_to(&mut self, now: SimTime) -> bool {
        let reached = self.nodes.partition_point(|n| n.arrival_time <= now);
        let target  = reached.saturating_sub(1).max(self.cursor);
        let moved   = target != self.cursor;
        self.cursor = target;
        moved
    }

    /// Expected position at `t`.  Before the start the vehicle waits at the
    /// first vertex; after the end it stays at the last one.
    pub fn position_at(&self, t: SimTime) -> TrajectoryPosition {
        if t <= self.start_time() {
            return TrajectoryPosition::AtVertex(self.nodes[0].vertex);
        }
        if t >= self.end_time() {
            return TrajectoryPosition::AtVertex(self.final_vertex());
        }
        let i = self.nodes.partition_point(|n| n.arrival_time <= t) - 1;
        let tail = self.nodes[i];
        let head = self.nodes[i + 1];
        let tt = head.arrival_time - tail.arrival_time;
        let offset = if tt > 0.0 { (t - tail.arrival_time) / tt * tail.edge_length } else { 0.0 };
        if offset <= 0.0 {
            TrajectoryPosition::AtVertex(tail.vertex)
        } else {
            TrajectoryPosition::OnEdge { tail: tail.vertex, head: head.vertex, offset }
        }
    }
}
