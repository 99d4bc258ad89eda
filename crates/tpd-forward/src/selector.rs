//! Next-carrier selection.
//!
//! # Greedy
//!
//! Every candidate around the carrier gets fresh EDR/EDD toward the packet's
//! destination.  A candidate qualifies if its EDR reaches
//! `delivery_probability_threshold` and its EDD is strictly below the
//! carrier's.  The packet moves only if some candidate qualifies.
//!
//! # Source routing
//!
//! Candidates are checked against the encounter graph frozen into the
//! packet: only children of the current carrier qualify (and, with the
//! optimal-subsequence variant, only children in the carrier's forwarding
//! set).  Their frozen EDR/EDD rank them.
//!
//! # Ranking
//!
//! Within a search group and then across the group winners: smaller EDD,
//! then larger EDR, then smaller vehicle id (greedy) or earlier position in
//! the carrier's neighbor list (source routing).

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use tpd_core::{EdgeId, RoutingMode, SimTime, TpdConfig, VehicleId};
use tpd_encounter::{EncounterOracle, LiveVehicles};
use tpd_graph::{DeliveryMetrics, GraphWorkspace, TpdEngine};
use tpd_spatial::RoadNetwork;

use crate::{ContactIndex, ForwardError, ForwardResult, MetricsBoard, Packet};

// ── DeliveryEstimator ─────────────────────────────────────────────────────────

/// Source of live EDR/EDD estimates for greedy routing.
pub trait DeliveryEstimator {
    fn estimate(&mut self, now: SimTime, vehicle: VehicleId, destination: VehicleId) -> ForwardResult<DeliveryMetrics>;
}

/// [`DeliveryEstimator`] that runs a full encounter-graph query per
/// estimate, reusing one workspace.
pub struct EngineEstimator<'a, O, L> {
    engine:    TpdEngine<'a, O, L>,
    workspace: GraphWorkspace,
}

impl<'a, O, L> EngineEstimator<'a, O, L> {
    pub fn new(engine: TpdEngine<'a, O, L>) -> Self {
        Self { engine, workspace: GraphWorkspace::new() }
    }
}

impl<O: EncounterOracle, L: LiveVehicles> DeliveryEstimator for EngineEstimator<'_, O, L> {
    fn estimate(&mut self, now: SimTime, vehicle: VehicleId, destination: VehicleId) -> ForwardResult<DeliveryMetrics> {
        Ok(self.engine.compute_edr_and_edd(&mut self.workspace, now, vehicle, destination)?)
    }
}

// ── Handoff ───────────────────────────────────────────────────────────────────

/// A completed carrier change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handoff {
    pub from: VehicleId,
    pub to: VehicleId,
    /// The new carrier's metrics at hand-off.
    pub metrics: DeliveryMetrics,
    /// The edge whose search group produced the winner.
    pub edge: EdgeId,
}

#[derive(Clone, Copy)]
struct Candidate {
    vehicle:  VehicleId,
    metrics:  DeliveryMetrics,
    tiebreak: usize,
    edge:     EdgeId,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        if self.metrics.beats(&other.metrics) {
            return true;
        }
        if other.metrics.beats(&self.metrics) {
            return false;
        }
        self.tiebreak < other.tiebreak
    }
}

fn keep_better(best: &mut Option<Candidate>, c: Candidate) {
    if best.is_none_or(|b| c.beats(&b)) {
        *best = Some(c);
    }
}

// ── NextCarrierSelector ───────────────────────────────────────────────────────

/// Decides whether, and to whom, the current carrier hands a packet.
pub struct NextCarrierSelector<'a> {
    network:  &'a RoadNetwork,
    contacts: &'a ContactIndex,
    config:   &'a TpdConfig,
    board:    Option<&'a MetricsBoard>,
}

impl<'a> NextCarrierSelector<'a> {
    pub fn new(network: &'a RoadNetwork, contacts: &'a ContactIndex, config: &'a TpdConfig) -> Self {
        Self { network, contacts, config, board: None }
    }

    /// Record every greedy estimate on `board`.
    pub fn with_board(mut self, board: &'a MetricsBoard) -> Self {
        self.board = Some(board);
        self
    }

    /// Apply the configured routing policy to `packet` at `now`.
    pub fn select<E: DeliveryEstimator>(
        &self,
        estimator: &mut E,
        packet:    &mut Packet,
        now:       SimTime,
    ) -> ForwardResult<Option<Handoff>> {
        match self.config.routing_mode() {
            RoutingMode::Greedy => self.greedy(estimator, packet, now),
            RoutingMode::Source => self.source(packet, now),
        }
    }

    /// Greedy policy.
    pub fn greedy<E: DeliveryEstimator>(
        &self,
        estimator: &mut E,
        packet:    &mut Packet,
        now:       SimTime,
    ) -> ForwardResult<Option<Handoff>> {
        packet.ensure_alive(now)?;
        if packet.is_delivered() {
            return Ok(None);
        }
        let carrier = packet.carrier();
        let destination = packet.destination;
        let location = self.contacts.location(carrier).ok_or(ForwardError::CarrierNotLocated(carrier))?;
        let current = self.estimate(estimator, now, carrier, destination)?;

        let mut cache: FxHashMap<VehicleId, DeliveryMetrics> = FxHashMap::default();
        let mut best = None;
        for group in location.search_groups(self.network) {
            let mut group_best = None;
            for v in self.candidates(carrier, &group) {
                let metrics = match cache.get(&v) {
                    Some(&m) => m,
                    None => {
                        let m = self.estimate(estimator, now, v, destination)?;
                        cache.insert(v, m);
                        m
                    }
                };
                if metrics.edr < self.config.delivery_probability_threshold || !(metrics.edd < current.edd) {
                    continue;
                }
                trace!(%carrier, candidate = %v, edr = metrics.edr, edd = metrics.edd, "greedy candidate");
                keep_better(&mut group_best, Candidate { vehicle: v, metrics, tiebreak: v.index(), edge: group[0] });
            }
            if let Some(winner) = group_best {
                keep_better(&mut best, winner);
            }
        }

        self.commit(packet, best)
    }

    /// Source-routing policy.
    pub fn source(&self, packet: &mut Packet, now: SimTime) -> ForwardResult<Option<Handoff>> {
        packet.ensure_alive(now)?;
        if packet.is_delivered() {
            return Ok(None);
        }
        let carrier = packet.carrier();
        let location = self.contacts.location(carrier).ok_or(ForwardError::CarrierNotLocated(carrier))?;
        let graph = packet.frozen_graph().ok_or(ForwardError::NotSourceRouted(packet.id))?;
        let node = graph.require(carrier)?;
        let subsequence_only = self.config.encounter_graph_optimization;

        let mut best = None;
        for group in location.search_groups(self.network) {
            let mut group_best = None;
            for v in self.candidates(carrier, &group) {
                let Some(pos) = node.neighbor_position(v) else {
                    continue;
                };
                if subsequence_only && !node.neighbors[pos].in_subsequence {
                    continue;
                }
                let child = graph.require(v)?;
                let metrics = DeliveryMetrics { edr: child.edr, edd: child.edd };
                keep_better(&mut group_best, Candidate { vehicle: v, metrics, tiebreak: pos, edge: group[0] });
            }
            if let Some(winner) = group_best {
                keep_better(&mut best, winner);
            }
        }

        self.commit(packet, best)
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn candidates(&self, carrier: VehicleId, group: &[EdgeId]) -> Vec<VehicleId> {
        self.contacts.candidates(
            self.network,
            carrier,
            group,
            self.config.communication_range,
            self.config.forwarding_type,
        )
    }

    fn estimate<E: DeliveryEstimator>(
        &self,
        estimator:   &mut E,
        now:         SimTime,
        vehicle:     VehicleId,
        destination: VehicleId,
    ) -> ForwardResult<DeliveryMetrics> {
        let metrics = estimator.estimate(now, vehicle, destination)?;
        if let Some(board) = self.board {
            board.record(vehicle, destination, metrics, now);
        }
        Ok(metrics)
    }

    fn commit(&self, packet: &mut Packet, best: Option<Candidate>) -> ForwardResult<Option<Handoff>> {
        let Some(winner) = best else {
            return Ok(None);
        };
        let from = packet.carrier();
        packet.hand_off(winner.vehicle)?;
        debug!(
            packet = %packet.id,
            %from,
            to = %winner.vehicle,
            edr = winner.metrics.edr,
            edd = winner.metrics.edd,
            "packet handed off"
        );
        Ok(Some(Handoff { from, to: winner.vehicle, metrics: winner.metrics, edge: winner.edge }))
    }
}
