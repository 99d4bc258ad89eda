//! Vehicles and their travel-time statistics.

use tpd_core::{SimTime, VehicleId};

use crate::Trajectory;

/// Per-metre travel-time distribution of one vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelTimeStats {
    /// Mean seconds per metre.
    pub unit_mean: f64,
    /// Variance of the seconds-per-metre increment (s²/m).
    pub unit_variance: f64,
}

impl TravelTimeStats {
    /// Stats for a vehicle cruising at `speed_mps` whose per-metre travel
    /// time has coefficient of variation `cv`.
    pub fn from_speed(speed_mps: f64, cv: f64) -> Self {
        let unit_mean = 1.0 / speed_mps;
        let sd = cv * unit_mean;
        Self { unit_mean, unit_variance: sd * sd }
    }

    /// Deterministic travel (zero variance).
    pub fn exact(speed_mps: f64) -> Self {
        Self::from_speed(speed_mps, 0.0)
    }

    #[inline]
    pub fn travel_time(&self, length_m: f64) -> f64 {
        length_m * self.unit_mean
    }

    /// Standard deviation of the arrival time after `distance_m` metres.
    #[inline]
    pub fn arrival_std(&self, distance_m: f64) -> f64 {
        (distance_m.max(0.0) * self.unit_variance).sqrt()
    }
}

/// A mobile packet carrier.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    /// Cruising speed in m/s.
    pub speed: f64,
    pub trajectory: Trajectory,
    pub stats: TravelTimeStats,
}

impl Vehicle {
    pub fn new(id: VehicleId, speed: f64, trajectory: Trajectory, stats: TravelTimeStats) -> Self {
        Self { id, speed, trajectory, stats }
    }

    /// Advance the trajectory cursor to `now`.
    #[inline]
    pub fn advance_to(&mut self, now: SimTime) -> bool {
        self.trajectory.advance_to(now)
    }
}
