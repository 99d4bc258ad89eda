//! Best-first construction of the encounter graph.
//!
//! ```text
//! push (source, T0)
//! while let Some(entry) = frontier.pop():
//!     if entry.vehicle admitted and not the destination → discard
//!     admit (or reuse the destination), link the parent edge
//!     if entry.vehicle is the destination → do not expand
//!     for every other live vehicle v:
//!         if oracle(entry.vehicle, v, not before entry.key + margin)
//!             → push (v, T_encounter)
//! ```
//!
//! Entries pop in encounter-time order, so each node's neighbor list comes
//! out in non-decreasing encounter time.  Each vehicle is admitted at most
//! once, which bounds the loop.

use tracing::{debug, trace};

use tpd_core::{SimTime, TpdConfig, TpdError, VehicleId};
use tpd_encounter::{EncounterOracle, LiveVehicles};

use crate::{EncounterGraph, Frontier, FrontierEntry, GraphResult, ParentLink};

/// What one build did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Nodes created.
    pub admitted: usize,
    /// Entries popped for vehicles that were already admitted.
    pub discarded: usize,
    /// Entries pushed onto the frontier, the root included.
    pub pushes: usize,
    pub oracle_calls: usize,
    /// Encounters predicted after the packet's time-to-live runs out.
    pub rejected_expired: usize,
    /// Key each vehicle was admitted at, indexed by vehicle id.
    pub first_encounter: Vec<Option<SimTime>>,
}

impl BuildReport {
    /// Predicted first-encounter time of `vehicle`, if it was admitted.
    pub fn first_encounter_of(&self, vehicle: VehicleId) -> Option<SimTime> {
        self.first_encounter.get(vehicle.index()).copied().flatten()
    }
}

/// Builds encounter graphs from an oracle and a live-vehicle set.
pub struct GraphBuilder<'a, O, L> {
    oracle:   &'a O,
    vehicles: &'a L,
    config:   &'a TpdConfig,
}

impl<'a, O, L> GraphBuilder<'a, O, L>
where
    O: EncounterOracle,
    L: LiveVehicles,
{
    pub fn new(oracle: &'a O, vehicles: &'a L, config: &'a TpdConfig) -> Self {
        Self { oracle, vehicles, config }
    }

    /// Build the graph from `source` toward `destination` at time `t0`.
    ///
    /// `graph` and `frontier` are reset first.  Both vehicles must be live.
    pub fn build(
        &self,
        graph:       &mut EncounterGraph,
        frontier:    &mut Frontier,
        source:      VehicleId,
        destination: VehicleId,
        t0:          SimTime,
    ) -> GraphResult<BuildReport> {
        for v in [source, destination] {
            if !self.vehicles.is_live(v) {
                return Err(TpdError::VehicleNotFound(v).into());
            }
        }

        graph.reset(self.vehicles.vehicle_capacity(), source, destination, t0);
        frontier.clear();

        let horizon = t0.offset(self.config.packet_time_to_live);
        let margin = self.config.causality_margin;
        let mut report = BuildReport {
            first_encounter: vec![None; self.vehicles.vehicle_capacity()],
            ..BuildReport::default()
        };

        frontier.push(FrontierEntry { vehicle: source, key: t0, parent: None });

        while let Some(entry) = frontier.pop() {
            let current = entry.vehicle;
            if current != destination && graph.contains(current) {
                report.discarded += 1;
                continue;
            }

            let (_, fresh) = graph.admit(current);
            if fresh {
                report.admitted += 1;
                let i = current.index();
                if i >= report.first_encounter.len() {
                    report.first_encounter.resize(i + 1, None);
                }
                report.first_encounter[i] = Some(entry.key);
            }
            if let Some(link) = entry.parent {
                graph.link(link.parent, current, link.encounter)?;
            }
            if current == destination {
                trace!(parent = ?entry.parent.map(|l| l.parent), "destination reached");
                continue;
            }

            let threshold = entry.key;
            let not_before = threshold.offset(margin);
            for other in self.vehicles.live_vehicles() {
                if other == current || (other != destination && graph.contains(other)) {
                    continue;
                }
                report.oracle_calls += 1;
                let Some(encounter) = self.oracle.encounter_after(current, other, threshold, not_before) else {
                    continue;
                };
                if encounter.time > horizon {
                    report.rejected_expired += 1;
                    continue;
                }
                trace!(
                    %current, %other,
                    time = encounter.time.secs(),
                    probability = encounter.probability,
                    "candidate child"
                );
                frontier.push(FrontierEntry {
                    vehicle: other,
                    key:     encounter.time,
                    parent:  Some(ParentLink { parent: current, encounter }),
                });
            }
        }

        report.pushes = frontier.pushes();
        debug!(
            %source, %destination,
            admitted = report.admitted,
            discarded = report.discarded,
            pushes = report.pushes,
            oracle_calls = report.oracle_calls,
            reached = graph.destination().is_some(),
            "encounter graph built"
        );
        Ok(report)
    }
}
