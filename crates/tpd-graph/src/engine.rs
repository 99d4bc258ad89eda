//! `TpdEngine`: one EDR/EDD query end to end.
//!
//! ```text
//! build → destination reached? ─ no ─→ unreachable (EDR 0, EDD ∞)
//!                │ yes
//!                ▼
//!              prune → order → resolve EDR → resolve EDD → root metrics
//! ```

use tracing::debug;

use tpd_core::{EdrVariant, SimTime, TpdConfig, TpdError, VehicleId};
use tpd_encounter::{EncounterOracle, LiveVehicles};

use crate::resolver::EDR_EPSILON;
use crate::{
    prune, resolution_order, resolve_edd, resolve_edr, BuildReport, EncounterGraph, Frontier,
    GraphBuilder, GraphResult,
};

// ── DeliveryMetrics ───────────────────────────────────────────────────────────

/// Expected delivery ratio and delay of one carrier toward one destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryMetrics {
    /// Probability in `[0, 1]` that the packet reaches the destination.
    pub edr: f64,
    /// Expected seconds until delivery, given delivery.  Infinite when
    /// `edr` is zero.
    pub edd: f64,
}

impl DeliveryMetrics {
    /// The carrier is the destination.
    pub const DELIVERED: DeliveryMetrics = DeliveryMetrics { edr: 1.0, edd: 0.0 };

    /// No encounter chain reaches the destination.
    pub const UNREACHABLE: DeliveryMetrics = DeliveryMetrics { edr: 0.0, edd: f64::INFINITY };

    pub fn is_reachable(&self) -> bool {
        self.edr > EDR_EPSILON
    }

    /// `true` if `self` is a strictly better carrier than `other`: smaller
    /// EDD, or equal EDD and larger EDR.
    pub fn beats(&self, other: &DeliveryMetrics) -> bool {
        match self.edd.total_cmp(&other.edd) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Equal => self.edr > other.edr,
            std::cmp::Ordering::Greater => false,
        }
    }
}

// ── GraphWorkspace ────────────────────────────────────────────────────────────

/// Reusable graph and frontier storage.
///
/// A workspace is owned by whoever issues queries; each query resets it, so
/// node and heap allocations carry over from one query to the next.
#[derive(Default)]
pub struct GraphWorkspace {
    pub graph:    EncounterGraph,
    pub frontier: Frontier,
}

impl GraphWorkspace {
    pub fn new() -> Self {
        Self::default()
    }
}

// ── RoutePlan ─────────────────────────────────────────────────────────────────

/// A resolved query: the source's metrics plus the pruned, resolved graph,
/// ready to be frozen into a packet.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub metrics: DeliveryMetrics,
    pub graph:   EncounterGraph,
    pub report:  BuildReport,
}

// ── TpdEngine ─────────────────────────────────────────────────────────────────

/// Runs build, prune and resolve for a single `(source, destination)` query.
pub struct TpdEngine<'a, O, L> {
    oracle:   &'a O,
    vehicles: &'a L,
    config:   &'a TpdConfig,
}

impl<'a, O, L> TpdEngine<'a, O, L>
where
    O: EncounterOracle,
    L: LiveVehicles,
{
    pub fn new(oracle: &'a O, vehicles: &'a L, config: &'a TpdConfig) -> Self {
        Self { oracle, vehicles, config }
    }

    pub fn config(&self) -> &'a TpdConfig {
        self.config
    }

    pub fn variant(&self) -> EdrVariant {
        self.config.edr_variant()
    }

    /// EDR and EDD of `source` toward `destination` at time `now`.
    pub fn compute_edr_and_edd(
        &self,
        ws:          &mut GraphWorkspace,
        now:         SimTime,
        source:      VehicleId,
        destination: VehicleId,
    ) -> GraphResult<DeliveryMetrics> {
        if source == destination {
            if !self.vehicles.is_live(source) {
                return Err(TpdError::VehicleNotFound(source).into());
            }
            return Ok(DeliveryMetrics::DELIVERED);
        }
        self.run(ws, now, source, destination).map(|(metrics, _)| metrics)
    }

    /// Like [`compute_edr_and_edd`](Self::compute_edr_and_edd) but also
    /// returns a snapshot of the resolved graph.
    pub fn plan(
        &self,
        ws:          &mut GraphWorkspace,
        now:         SimTime,
        source:      VehicleId,
        destination: VehicleId,
    ) -> GraphResult<RoutePlan> {
        let (metrics, report) = self.run(ws, now, source, destination)?;
        Ok(RoutePlan { metrics, graph: ws.graph.snapshot(), report })
    }

    fn run(
        &self,
        ws:          &mut GraphWorkspace,
        now:         SimTime,
        source:      VehicleId,
        destination: VehicleId,
    ) -> GraphResult<(DeliveryMetrics, BuildReport)> {
        let builder = GraphBuilder::new(self.oracle, self.vehicles, self.config);
        let report = builder.build(&mut ws.graph, &mut ws.frontier, source, destination, now)?;

        if ws.graph.destination().is_none() {
            debug!(%source, %destination, "destination not reachable");
            return Ok((DeliveryMetrics::UNREACHABLE, report));
        }

        prune(&mut ws.graph)?;
        let order = resolution_order(&ws.graph)?;
        resolve_edr(&mut ws.graph, &order, self.variant())?;
        resolve_edd(&mut ws.graph, &order)?;

        let root = ws.graph.require(source)?;
        let metrics = if root.edr > EDR_EPSILON {
            DeliveryMetrics { edr: root.edr, edd: root.edd }
        } else {
            DeliveryMetrics::UNREACHABLE
        };
        debug!(%source, %destination, edr = metrics.edr, edd = metrics.edd, "delivery metrics");
        Ok((metrics, report))
    }
}
