//! The predicted encounter graph.
//!
//! # Layout
//!
//! Nodes live in an arena indexed by `VehicleId`: slot `i` holds the node of
//! vehicle `i` or `None`.  The arena doubles as the presence map, so "has
//! this vehicle been admitted?" is one indexed load.  Neighbor and parent
//! lists hold vehicle ids, never references, so removing a node is a matter
//! of clearing its slot and filtering it out of its parent's neighbor list.
//!
//! # Shape
//!
//! Every node except the destination has exactly one parent entry.  The
//! destination may have several, one per vehicle predicted to meet it.  The
//! graph is therefore a tree rooted at the source whose branches may only
//! re-converge at the destination.
//!
//! # Pooling
//!
//! Removed nodes go to a free list with their lists cleared but their
//! allocations kept.  [`EncounterGraph::reset`] recycles every node, so a
//! graph reused across queries (see `GraphWorkspace`) stops allocating once
//! it has seen its largest query.

use tpd_core::{SimTime, VehicleId};
use tpd_encounter::Encounter;

use crate::{GraphError, GraphResult};

// ── EncounterEdge ─────────────────────────────────────────────────────────────

/// One neighbor-list or parent-list entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncounterEdge {
    /// The vehicle at the other end: the child for a neighbor entry, the
    /// parent for a parent entry.
    pub peer: VehicleId,
    /// When, where and how likely the two vehicles meet.
    pub encounter: Encounter,
    /// Whether the owner forwards to this child.  Every child is in the
    /// forwarding set under full fan-out; the optimal-subsequence variant
    /// clears the flag on skipped children.  Unused on parent entries.
    pub in_subsequence: bool,
}

impl EncounterEdge {
    #[inline]
    pub fn probability(&self) -> f64 {
        self.encounter.probability
    }

    #[inline]
    pub fn delay(&self) -> f64 {
        self.encounter.delay
    }
}

// ── GraphNode ─────────────────────────────────────────────────────────────────

/// An admitted vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub vehicle: VehicleId,
    /// Children in non-decreasing encounter time.
    pub neighbors: Vec<EncounterEdge>,
    pub parents: Vec<EncounterEdge>,
    pub edr_resolved: bool,
    pub edd_resolved: bool,
    /// EDR under the configured variant.
    pub edr: f64,
    /// EDR with every child in the forwarding set.  Equals `edr` under full
    /// fan-out; EDD is always weighted by this one.
    pub edr_full: f64,
    pub edd: f64,
    pub reference_count: u32,
}

impl GraphNode {
    fn new(vehicle: VehicleId) -> Self {
        Self {
            vehicle,
            neighbors:       Vec::new(),
            parents:         Vec::new(),
            edr_resolved:    false,
            edd_resolved:    false,
            edr:             0.0,
            edr_full:        0.0,
            edd:             0.0,
            reference_count: 0,
        }
    }

    /// Clear for reuse, keeping list allocations.
    fn recycle(&mut self, vehicle: VehicleId) {
        self.vehicle = vehicle;
        self.neighbors.clear();
        self.parents.clear();
        self.clear_resolution();
        self.reference_count = 0;
    }

    pub(crate) fn clear_resolution(&mut self) {
        self.edr_resolved = false;
        self.edd_resolved = false;
        self.edr = 0.0;
        self.edr_full = 0.0;
        self.edd = 0.0;
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Children the node forwards to, in encounter order.
    pub fn forwarding_set(&self) -> impl Iterator<Item = &EncounterEdge> + '_ {
        self.neighbors.iter().filter(|e| e.in_subsequence)
    }

    /// Position of `child` in the neighbor list.
    pub fn neighbor_position(&self, child: VehicleId) -> Option<usize> {
        self.neighbors.iter().position(|e| e.peer == child)
    }
}

// ── EncounterGraph ────────────────────────────────────────────────────────────

/// Arena of [`GraphNode`]s rooted at the query's source vehicle.
#[derive(Debug, Clone, Default)]
pub struct EncounterGraph {
    slots:      Vec<Option<GraphNode>>,
    /// Admission order; may contain ids of since-removed nodes.
    order:      Vec<VehicleId>,
    free:       Vec<GraphNode>,
    root:       VehicleId,
    target:     VehicleId,
    start_time: SimTime,
    len:        usize,
}

impl EncounterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every node and prepare for a query from `root` to `target` at
    /// `start_time`.  The presence map is sized for `capacity` vehicles.
    pub fn reset(&mut self, capacity: usize, root: VehicleId, target: VehicleId, start_time: SimTime) {
        for slot in &mut self.slots {
            if let Some(node) = slot.take() {
                self.free.push(node);
            }
        }
        self.slots.resize_with(capacity, || None);
        self.order.clear();
        self.root = root;
        self.target = target;
        self.start_time = start_time;
        self.len = 0;
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn root(&self) -> VehicleId {
        self.root
    }

    /// The destination vehicle the graph was built toward.
    pub fn target(&self) -> VehicleId {
        self.target
    }

    /// The destination node, once it has been admitted.
    pub fn destination(&self) -> Option<VehicleId> {
        self.contains(self.target).then_some(self.target)
    }

    pub fn start_time(&self) -> SimTime {
        self.start_time
    }

    /// Number of admitted nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the presence map.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn contains(&self, vehicle: VehicleId) -> bool {
        self.node(vehicle).is_some()
    }

    #[inline]
    pub fn node(&self, vehicle: VehicleId) -> Option<&GraphNode> {
        self.slots.get(vehicle.index())?.as_ref()
    }

    #[inline]
    pub fn node_mut(&mut self, vehicle: VehicleId) -> Option<&mut GraphNode> {
        self.slots.get_mut(vehicle.index())?.as_mut()
    }

    /// Like [`node`](Self::node) but a missing node is an invariant violation.
    pub fn require(&self, vehicle: VehicleId) -> GraphResult<&GraphNode> {
        self.node(vehicle)
            .ok_or_else(|| GraphError::inconsistent(vehicle, "node referenced but not present"))
    }

    pub(crate) fn require_mut(&mut self, vehicle: VehicleId) -> GraphResult<&mut GraphNode> {
        match self.slots.get_mut(vehicle.index()).and_then(Option::as_mut) {
            Some(node) => Ok(node),
            None => Err(GraphError::inconsistent(vehicle, "node referenced but not present")),
        }
    }

    /// Present nodes in admission order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> + '_ {
        self.order.iter().filter_map(|&v| self.node(v))
    }

    pub fn vehicles(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.nodes().map(|n| n.vehicle)
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode> + '_ {
        self.slots.iter_mut().flatten()
    }

    pub fn edr(&self, vehicle: VehicleId) -> Option<f64> {
        self.node(vehicle).filter(|n| n.edr_resolved).map(|n| n.edr)
    }

    pub fn edd(&self, vehicle: VehicleId) -> Option<f64> {
        self.node(vehicle).filter(|n| n.edd_resolved).map(|n| n.edd)
    }

    pub fn neighbors(&self, vehicle: VehicleId) -> &[EncounterEdge] {
        self.node(vehicle).map_or(&[], |n| n.neighbors.as_slice())
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Admit `vehicle`, or return its existing node.  Returns `true` as the
    /// second element when the node is new.
    pub fn admit(&mut self, vehicle: VehicleId) -> (&mut GraphNode, bool) {
        let i = vehicle.index();
        if i >= self.slots.len() {
            self.slots.resize_with(i + 1, || None);
        }
        let fresh = self.slots[i].is_none();
        if fresh {
            let node = match self.free.pop() {
                Some(mut node) => {
                    node.recycle(vehicle);
                    node
                }
                None => GraphNode::new(vehicle),
            };
            self.slots[i] = Some(node);
            self.order.push(vehicle);
            self.len += 1;
        }
        let node = self.slots[i].get_or_insert_with(|| GraphNode::new(vehicle));
        (node, fresh)
    }

    /// Record that `parent` forwards to `child` via `encounter`: append to the
    /// parent's neighbor list and the child's parent list.
    pub fn link(&mut self, parent: VehicleId, child: VehicleId, encounter: Encounter) -> GraphResult<()> {
        if !self.contains(child) {
            return Err(GraphError::inconsistent(child, "linked before admission"));
        }
        self.require_mut(parent)?.neighbors.push(EncounterEdge {
            peer: child,
            encounter,
            in_subsequence: true,
        });
        self.require_mut(child)?.parents.push(EncounterEdge {
            peer: parent,
            encounter,
            in_subsequence: true,
        });
        Ok(())
    }

    /// Remove `vehicle`'s node and return it to the pool.  Edges pointing at
    /// it from other nodes are the caller's responsibility.
    pub fn remove(&mut self, vehicle: VehicleId) -> bool {
        let Some(node) = self.slots.get_mut(vehicle.index()).and_then(Option::take) else {
            return false;
        };
        self.free.push(node);
        self.len -= 1;
        true
    }

    /// Drop removed vehicles from the admission order.
    pub(crate) fn compact_order(&mut self) {
        let slots = &self.slots;
        self.order.retain(|v| slots.get(v.index()).is_some_and(Option::is_some));
    }

    /// Clear every node's EDR/EDD so the resolvers can run again.
    pub fn clear_resolution(&mut self) {
        for node in self.nodes_mut() {
            node.clear_resolution();
        }
    }

    /// An independent copy holding only the live nodes, for storing with a
    /// packet.
    pub fn snapshot(&self) -> EncounterGraph {
        let mut copy = EncounterGraph {
            slots:      vec![None; self.slots.len()],
            order:      Vec::with_capacity(self.len),
            free:       Vec::new(),
            root:       self.root,
            target:     self.target,
            start_time: self.start_time,
            len:        self.len,
        };
        for node in self.nodes() {
            copy.slots[node.vehicle.index()] = Some(node.clone());
            copy.order.push(node.vehicle);
        }
        copy
    }
}
