//! Seeded synthetic trajectories.
//!
//! Every vehicle draws from its own [`VehicleRng`], so a vehicle's trajectory
//! depends only on `(seed, vehicle id)` and the network.

use std::ops::Range;

use tracing::trace;

use tpd_core::{EdgeId, NodeId, SimTime, VehicleId, VehicleRng};
use tpd_spatial::{RoadNetwork, Router};

use crate::{Trajectory, TrajectoryError, TrajectoryResult, TravelTimeStats, Vehicle, VehicleFleet};

/// Knobs for synthetic trajectory generation.
#[derive(Debug, Clone)]
pub struct GeneratorParams {
    /// Number of edges in a random-walk trajectory.
    pub hops: usize,
    /// Cruising speed range in m/s.
    pub speed_range: Range<f64>,
    /// Coefficient of variation of the per-metre travel time.
    pub speed_cv: f64,
    /// Departure times are drawn uniformly from this window (seconds).
    pub depart_window: Range<f64>,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            hops:          12,
            speed_range:   8.0..16.0,
            speed_cv:      0.1,
            depart_window: 0.0..60.0,
        }
    }
}

/// Builds vehicles with random-walk or shortest-path trajectories.
pub struct TrajectoryGenerator<'n> {
    network: &'n RoadNetwork,
    seed:    u64,
    params:  GeneratorParams,
}

impl<'n> TrajectoryGenerator<'n> {
    pub fn new(network: &'n RoadNetwork, seed: u64, params: GeneratorParams) -> Self {
        Self { network, seed, params }
    }

    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    /// A vehicle that starts at a random intersection and wanders for
    /// `params.hops` edges, avoiding immediate U-turns where possible.
    pub fn random_walk(&self, id: VehicleId) -> TrajectoryResult<Vehicle> {
        let mut rng = VehicleRng::new(self.seed, id);
        let start = self.random_node(&mut rng, id)?;
        let (speed, stats, depart) = self.draw_motion(&mut rng);

        let mut vertices = vec![start];
        let mut prev: Option<NodeId> = None;
        let mut here = start;
        for _ in 0..self.params.hops {
            let out: Vec<EdgeId> = self.network.out_edges(here).collect();
            let forward: Vec<EdgeId> = out
                .iter()
                .copied()
                .filter(|e| Some(self.network.edge_to[e.index()]) != prev)
                .collect();
            let candidates = if forward.is_empty() { &out } else { &forward };
            let Some(&edge) = rng.choose(candidates) else { break };
            prev = Some(here);
            here = self.network.edge_to[edge.index()];
            vertices.push(here);
        }

        trace!(vehicle = %id, hops = vertices.len() - 1, "random-walk trajectory");
        let trajectory = Trajectory::from_vertices(id, self.network, &vertices, depart, &stats)?;
        Ok(Vehicle::new(id, speed, trajectory, stats))
    }

    /// A vehicle that follows the shortest path between two random
    /// intersections.
    pub fn routed(&self, id: VehicleId, router: &dyn Router) -> TrajectoryResult<Vehicle> {
        let mut rng = VehicleRng::new(self.seed, id);
        let from = self.random_node(&mut rng, id)?;
        let to = self.random_node(&mut rng, id)?;
        let (speed, stats, depart) = self.draw_motion(&mut rng);

        let route = router.route(self.network, from, to)?;
        let trajectory = Trajectory::from_vertices(id, self.network, &route.vertices, depart, &stats)?;
        Ok(Vehicle::new(id, speed, trajectory, stats))
    }

    /// `count` random-walk vehicles with ids `0..count`.
    pub fn fleet(&self, count: usize) -> TrajectoryResult<VehicleFleet> {
        let mut fleet = VehicleFleet::with_capacity(count);
        for i in 0..count as u32 {
            fleet.insert(self.random_walk(VehicleId(i))?);
        }
        Ok(fleet)
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn random_node(&self, rng: &mut VehicleRng, id: VehicleId) -> TrajectoryResult<NodeId> {
        if self.network.is_empty() {
            return Err(TrajectoryError::Invalid {
                vehicle: id,
                reason:  "road network has no intersections".into(),
            });
        }
        Ok(NodeId(rng.gen_range(0..self.network.node_count() as u32)))
    }

    fn draw_motion(&self, rng: &mut VehicleRng) -> (f64, TravelTimeStats, SimTime) {
        let speed = rng.uniform(&self.params.speed_range);
        let depart = SimTime(rng.uniform(&self.params.depart_window));
        (speed, TravelTimeStats::from_speed(speed, self.params.speed_cv), depart)
    }
}
