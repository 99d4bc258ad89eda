//! Where vehicles are right now and who is within radio range of whom.
//!
//! # Search groups
//!
//! The selector looks for candidates on the road elements around the
//! carrier, one *group* of directed edges at a time:
//!
//! | Carrier location        | Groups                                        |
//! |-------------------------|-----------------------------------------------|
//! | one-way segment         | `[edge]`                                      |
//! | two-way segment         | `[edge]`, `[reverse edge]`                    |
//! | intersection            | one group per incident edge, both directions  |
//!
//! A vehicle belongs to a group if it is on one of the group's edges or
//! waiting at one of their endpoints.

use std::collections::VecDeque;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::{FxHashMap, FxHashSet};

use tpd_core::{EdgeId, ForwardingType, NodeId, Point, SimTime, VehicleId};
use tpd_spatial::RoadNetwork;
use tpd_trajectory::{TrajectoryPosition, VehicleFleet};

// ── VehicleLocation ───────────────────────────────────────────────────────────

/// A vehicle's place on the road network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleLocation {
    Intersection(NodeId),
    Segment { edge: EdgeId, offset: f64 },
}

impl VehicleLocation {
    /// Locate a trajectory position on `network`.  `None` if the position
    /// names a vertex or edge the network does not have.
    pub fn resolve(network: &RoadNetwork, position: TrajectoryPosition) -> Option<Self> {
        match position {
            TrajectoryPosition::AtVertex(node) => {
                network.contains_node(node).then_some(VehicleLocation::Intersection(node))
            }
            TrajectoryPosition::OnEdge { tail, head, offset } => network
                .edge_between(tail, head)
                .map(|edge| VehicleLocation::Segment { edge, offset }),
        }
    }

    pub fn point(&self, network: &RoadNetwork) -> Point {
        match *self {
            VehicleLocation::Intersection(node) => network.node_pos[node.index()],
            VehicleLocation::Segment { edge, offset } => network.point_on_edge(edge, offset),
        }
    }

    /// `true` if the location lies on `edge` or at one of its endpoints.
    pub fn touches(&self, network: &RoadNetwork, edge: EdgeId) -> bool {
        match *self {
            VehicleLocation::Segment { edge: e, .. } => e == edge,
            VehicleLocation::Intersection(node) => {
                network.edge_from[edge.index()] == node || network.edge_to[edge.index()] == node
            }
        }
    }

    /// The edge groups searched for candidates around this location.
    pub fn search_groups(&self, network: &RoadNetwork) -> Vec<Vec<EdgeId>> {
        match *self {
            VehicleLocation::Segment { edge, .. } => match network.reverse_edge(edge) {
                Some(back) => vec![vec![edge], vec![back]],
                None => vec![vec![edge]],
            },
            VehicleLocation::Intersection(node) => {
                network.incident_edges(node).into_iter().map(|e| vec![e]).collect()
            }
        }
    }
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct VehicleEntry {
    point: [f64; 2],
    id:    VehicleId,
}

impl RTreeObject for VehicleEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for VehicleEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── ContactIndex ──────────────────────────────────────────────────────────────

/// Snapshot of every vehicle's location at one instant, with a spatial index
/// for range queries.
pub struct ContactIndex {
    tree:      RTree<VehicleEntry>,
    locations: FxHashMap<VehicleId, (VehicleLocation, Point)>,
    at:        SimTime,
}

impl ContactIndex {
    /// Locate every vehicle of `fleet` at `now`.  Vehicles whose predicted
    /// position is not on `network` are left out.
    pub fn build(network: &RoadNetwork, fleet: &VehicleFleet, now: SimTime) -> Self {
        let mut locations = FxHashMap::default();
        let mut entries = Vec::with_capacity(fleet.len());
        for vehicle in fleet.iter() {
            let Some(loc) = VehicleLocation::resolve(network, vehicle.trajectory.position_at(now)) else {
                continue;
            };
            let point = loc.point(network);
            locations.insert(vehicle.id, (loc, point));
            entries.push(VehicleEntry { point: point.as_array(), id: vehicle.id });
        }
        Self { tree: RTree::bulk_load(entries), locations, at: now }
    }

    /// Build from explicit locations.
    pub fn from_locations(
        network:   &RoadNetwork,
        locations: impl IntoIterator<Item = (VehicleId, VehicleLocation)>,
        now:       SimTime,
    ) -> Self {
        let mut map = FxHashMap::default();
        let mut entries = Vec::new();
        for (id, loc) in locations {
            let point = loc.point(network);
            map.insert(id, (loc, point));
            entries.push(VehicleEntry { point: point.as_array(), id });
        }
        Self { tree: RTree::bulk_load(entries), locations: map, at: now }
    }

    pub fn time(&self) -> SimTime {
        self.at
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn location(&self, vehicle: VehicleId) -> Option<VehicleLocation> {
        self.locations.get(&vehicle).map(|&(loc, _)| loc)
    }

    pub fn position(&self, vehicle: VehicleId) -> Option<Point> {
        self.locations.get(&vehicle).map(|&(_, p)| p)
    }

    /// Vehicles within `range` metres of `center`, in ascending id order.
    pub fn within(&self, center: Point, range: f64) -> Vec<VehicleId> {
        let mut ids: Vec<VehicleId> = self
            .tree
            .locate_within_distance(center.as_array(), range * range)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Candidate next carriers for `carrier` among vehicles touching
    /// `edges`, in ascending id order.
    ///
    /// With [`ForwardingType::Vehicle`] a candidate must be within `range`
    /// of the carrier.  With [`ForwardingType::Convoy`] it may instead be
    /// reached through a chain of in-range vehicles that all touch `edges`.
    pub fn candidates(
        &self,
        network: &RoadNetwork,
        carrier: VehicleId,
        edges:   &[EdgeId],
        range:   f64,
        kind:    ForwardingType,
    ) -> Vec<VehicleId> {
        let Some(origin) = self.position(carrier) else {
            return Vec::new();
        };
        let on_edges = |v: VehicleId| {
            self.location(v)
                .is_some_and(|loc| edges.iter().any(|&e| loc.touches(network, e)))
        };

        let mut found: Vec<VehicleId> = match kind {
            ForwardingType::Vehicle => self
                .within(origin, range)
                .into_iter()
                .filter(|&v| v != carrier && on_edges(v))
                .collect(),
            ForwardingType::Convoy => {
                let mut visited = FxHashSet::default();
                visited.insert(carrier);
                let mut queue = VecDeque::from([origin]);
                let mut out = Vec::new();
                while let Some(center) = queue.pop_front() {
                    for v in self.within(center, range) {
                        if !on_edges(v) || !visited.insert(v) {
                            continue;
                        }
                        out.push(v);
                        if let Some(p) = self.position(v) {
                            queue.push_back(p);
                        }
                    }
                }
                out
            }
        };
        found.sort_unstable();
        found
    }
}
