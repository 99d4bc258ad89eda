//! Data packets and their carrier cursor.

use tpd_core::{PacketId, SimTime, VehicleId};
use tpd_graph::{DeliveryMetrics, EncounterGraph, RoutePlan};

use crate::{ForwardError, ForwardResult};

/// A packet travelling from `source` to `destination`.
///
/// A greedy packet only tracks its current carrier.  A source-routed packet
/// also owns the encounter graph computed when it was created; its carrier
/// doubles as the cursor into that graph and may only move to a child of the
/// current carrier.
#[derive(Debug, Clone)]
pub struct Packet {
    pub id:          PacketId,
    pub source:      VehicleId,
    pub destination: VehicleId,
    pub created_at:  SimTime,
    /// Lifetime in seconds.
    pub ttl:         f64,
    carrier:         VehicleId,
    hops:            u32,
    frozen:          Option<Frozen>,
}

#[derive(Debug, Clone)]
struct Frozen {
    graph:   EncounterGraph,
    metrics: DeliveryMetrics,
}

impl Packet {
    /// A greedy-routed packet held by `source`.
    pub fn new(id: PacketId, source: VehicleId, destination: VehicleId, created_at: SimTime, ttl: f64) -> Self {
        Self {
            id,
            source,
            destination,
            created_at,
            ttl,
            carrier: source,
            hops: 0,
            frozen: None,
        }
    }

    /// A source-routed packet that freezes `plan`'s graph.  Source,
    /// destination and creation time come from the graph.
    pub fn source_routed(id: PacketId, plan: RoutePlan, ttl: f64) -> Self {
        let graph = plan.graph;
        let mut packet = Self::new(id, graph.root(), graph.target(), graph.start_time(), ttl);
        packet.frozen = Some(Frozen { graph, metrics: plan.metrics });
        packet
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn carrier(&self) -> VehicleId {
        self.carrier
    }

    /// Number of hand-offs so far.
    pub fn hops(&self) -> u32 {
        self.hops
    }

    pub fn expires_at(&self) -> SimTime {
        self.created_at.offset(self.ttl)
    }

    pub fn is_expired(&self, now: SimTime) -> bool {
        now > self.expires_at()
    }

    pub fn is_delivered(&self) -> bool {
        self.carrier == self.destination
    }

    pub fn is_source_routed(&self) -> bool {
        self.frozen.is_some()
    }

    /// The encounter graph frozen at creation, for source-routed packets.
    pub fn frozen_graph(&self) -> Option<&EncounterGraph> {
        self.frozen.as_ref().map(|f| &f.graph)
    }

    /// The source's metrics at creation, for source-routed packets.
    pub fn planned_metrics(&self) -> Option<DeliveryMetrics> {
        self.frozen.as_ref().map(|f| f.metrics)
    }

    pub fn ensure_alive(&self, now: SimTime) -> ForwardResult<()> {
        if self.is_expired(now) {
            return Err(ForwardError::PacketExpired { packet: self.id, expired_at: self.expires_at() });
        }
        Ok(())
    }

    // ── Hand-off ──────────────────────────────────────────────────────────

    /// Give the packet to `to`.  For a source-routed packet `to` must be a
    /// child of the current carrier in the frozen graph, and the cursor
    /// moves with it.
    pub fn hand_off(&mut self, to: VehicleId) -> ForwardResult<()> {
        if let Some(frozen) = &self.frozen {
            let is_child = frozen
                .graph
                .node(self.carrier)
                .is_some_and(|n| n.neighbor_position(to).is_some());
            if !is_child {
                return Err(ForwardError::NotAChild { carrier: self.carrier, candidate: to });
            }
        }
        self.carrier = to;
        self.hops += 1;
        Ok(())
    }
}
