//! `ScriptedOracle`: encounters given as an explicit table.
//!
//! Useful when meetings come from an external simulator or a trace rather
//! than from predicted trajectories, and for exercising the graph algorithms
//! on hand-written scenarios.

use rustc_hash::FxHashMap;

use tpd_core::{NodeId, SimTime, VehicleId};

use crate::{Encounter, EncounterOracle, LiveVehicles};

#[derive(Debug, Clone, Copy)]
struct Meeting {
    time:        SimTime,
    probability: f64,
    tail:        NodeId,
    head:        NodeId,
    edge_length: f64,
    offset:      f64,
}

/// An oracle and live-vehicle set backed by a table of meetings.
///
/// Meetings are symmetric: `meet(a, b, ..)` is visible from both sides.  A
/// query returns the earliest listed meeting at or after `not_before`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    live:     Vec<bool>,
    meetings: FxHashMap<(VehicleId, VehicleId), Vec<Meeting>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// An oracle with vehicles `0..count` live and no meetings.
    pub fn with_vehicles(count: u32) -> Self {
        let mut oracle = Self::new();
        for i in 0..count {
            oracle.add_vehicle(VehicleId(i));
        }
        oracle
    }

    pub fn add_vehicle(&mut self, id: VehicleId) -> &mut Self {
        if id.index() >= self.live.len() {
            self.live.resize(id.index() + 1, false);
        }
        self.live[id.index()] = true;
        self
    }

    pub fn remove_vehicle(&mut self, id: VehicleId) -> &mut Self {
        if let Some(slot) = self.live.get_mut(id.index()) {
            *slot = false;
        }
        self
    }

    /// Record that `a` and `b` meet at `time` with `probability`.
    pub fn meet(&mut self, a: VehicleId, b: VehicleId, time: f64, probability: f64) -> &mut Self {
        self.meet_on(a, b, time, probability, NodeId::INVALID, NodeId::INVALID, 0.0, 0.0)
    }

    /// Like [`meet`](Self::meet) but with the road segment and offset.
    #[allow(clippy::too_many_arguments)]
    pub fn meet_on(
        &mut self,
        a:           VehicleId,
        b:           VehicleId,
        time:        f64,
        probability: f64,
        tail:        NodeId,
        head:        NodeId,
        edge_length: f64,
        offset:      f64,
    ) -> &mut Self {
        self.add_vehicle(a).add_vehicle(b);
        let m = Meeting { time: SimTime(time), probability, tail, head, edge_length, offset };
        for key in [(a, b), (b, a)] {
            let list = self.meetings.entry(key).or_default();
            let at = list.partition_point(|x| x.time <= m.time);
            list.insert(at, m);
        }
        self
    }
}

impl EncounterOracle for ScriptedOracle {
    fn encounter_after(
        &self,
        current:    VehicleId,
        other:      VehicleId,
        threshold:  SimTime,
        not_before: SimTime,
    ) -> Option<Encounter> {
        if current == other || !self.is_live(current) || !self.is_live(other) {
            return None;
        }
        let m = self
            .meetings
            .get(&(current, other))?
            .iter()
            .find(|m| m.time >= not_before.max(threshold))?;
        Some(Encounter {
            tail:        m.tail,
            head:        m.head,
            edge_length: m.edge_length,
            time:        m.time,
            delay:       m.time - threshold,
            probability: m.probability,
            offset:      m.offset,
        })
    }
}

impl LiveVehicles for ScriptedOracle {
    fn vehicle_capacity(&self) -> usize {
        self.live.len()
    }

    fn live_vehicles(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.live
            .iter()
            .enumerate()
            .filter(|&(_, &live)| live)
            .map(|(i, _)| VehicleId(i as u32))
    }

    fn is_live(&self, id: VehicleId) -> bool {
        self.live.get(id.index()).copied().unwrap_or(false)
    }
}
