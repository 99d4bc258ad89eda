//! Encounter prediction between pairs of vehicles.

use tracing::trace;

use tpd_core::{NodeId, SimTime, TpdConfig, VehicleId};
use tpd_trajectory::{TrajectoryEdge, Vehicle, VehicleFleet};

use crate::{GaussianMeetingModel, MeetingProbability, MeetingQuery};

// ── Encounter ─────────────────────────────────────────────────────────────────

/// A predicted meeting of two vehicles on one road segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Encounter {
    /// Segment endpoints, oriented the way the expanding vehicle travels.
    pub tail: NodeId,
    pub head: NodeId,
    pub edge_length: f64,
    /// Predicted meeting instant.
    pub time: SimTime,
    /// Seconds between the query threshold and `time`.
    pub delay: f64,
    pub probability: f64,
    /// Distance from `tail` at which the meeting happens.
    pub offset: f64,
}

// ── Collaborator traits ───────────────────────────────────────────────────────

/// Answers "will `current` meet `other`, and when?".
pub trait EncounterOracle {
    /// The earliest encounter of `current` with `other` at or after
    /// `not_before`, or `None` if they are not predicted to meet.  The
    /// returned `delay` is measured from `threshold`.
    ///
    /// Callers pass `not_before >= threshold`.
    fn encounter_after(
        &self,
        current:    VehicleId,
        other:      VehicleId,
        threshold:  SimTime,
        not_before: SimTime,
    ) -> Option<Encounter>;

    /// The earliest encounter at or after `threshold`.
    fn encounter(&self, current: VehicleId, other: VehicleId, threshold: SimTime) -> Option<Encounter> {
        self.encounter_after(current, other, threshold, threshold)
    }
}

/// Enumerates the vehicles currently in the world.
pub trait LiveVehicles {
    /// Exclusive upper bound on vehicle ids.
    fn vehicle_capacity(&self) -> usize;

    /// Live vehicle ids in ascending order.
    fn live_vehicles(&self) -> impl Iterator<Item = VehicleId> + '_;

    /// Whether `id` is currently live.
    fn is_live(&self, id: VehicleId) -> bool;
}

impl LiveVehicles for VehicleFleet {
    fn vehicle_capacity(&self) -> usize {
        self.capacity()
    }

    fn live_vehicles(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.ids()
    }

    fn is_live(&self, id: VehicleId) -> bool {
        self.contains(id)
    }
}

// ── TrajectoryOracle ──────────────────────────────────────────────────────────

/// Encounter oracle over predicted trajectories.
///
/// Every pair of remaining trajectory edges that cover the same road segment
/// (in either direction) is a candidate.  On a candidate the two vehicles
/// are assumed to move at constant speed across their occupancy windows; the
/// encounter instant is the first moment inside both windows at which they
/// are within communication range.  The candidate survives only if the
/// meeting model rates its window overlap at least
/// `encounter_probability_threshold`.
pub struct TrajectoryOracle<'f, M = GaussianMeetingModel> {
    fleet:                 &'f VehicleFleet,
    model:                 M,
    communication_range:   f64,
    causality_margin:      f64,
    probability_threshold: f64,
}

impl<'f> TrajectoryOracle<'f> {
    pub fn new(fleet: &'f VehicleFleet, config: &TpdConfig) -> Self {
        Self::with_model(fleet, config, GaussianMeetingModel)
    }
}

impl<'f, M: MeetingProbability> TrajectoryOracle<'f, M> {
    pub fn with_model(fleet: &'f VehicleFleet, config: &TpdConfig, model: M) -> Self {
        Self {
            fleet,
            model,
            communication_range:   config.communication_range,
            causality_margin:      config.causality_margin,
            probability_threshold: config.encounter_probability_threshold,
        }
    }

    pub fn fleet(&self) -> &'f VehicleFleet {
        self.fleet
    }

    fn earliest(&self, v1: &Vehicle, v2: &Vehicle, threshold: SimTime, not_before: SimTime) -> Option<Encounter> {
        let others: Vec<TrajectoryEdge> = v2
            .trajectory
            .edges()
            .filter(|e| e.exit >= not_before)
            .collect();

        let mut best: Option<Encounter> = None;
        for e1 in v1.trajectory.edges() {
            if e1.exit < not_before {
                continue;
            }
            // Edges are time-ordered; nothing later can beat `best`.
            if best.is_some_and(|b| e1.enter.max(not_before) > b.time) {
                break;
            }
            for e2 in &others {
                let reverse = e1.is_reverse_of(e2);
                if !reverse && !e1.is_same_segment(e2) {
                    continue;
                }
                let Some((time, offset)) = self.meeting_point(&e1, e2, reverse, not_before) else {
                    continue;
                };
                if best.is_some_and(|b| time >= b.time) {
                    continue;
                }
                let query = MeetingQuery {
                    arrival_mean_2: e2.enter.secs(),
                    arrival_std_2:  v2.stats.arrival_std(e2.distance_to_tail),
                    arrival_mean_1: e1.enter.secs(),
                    arrival_std_1:  v1.stats.arrival_std(e1.distance_to_tail),
                    lower_bound:    -e2.travel_time(),
                    upper_bound:    e1.travel_time(),
                    travel_time_1:  e1.travel_time(),
                    travel_time_2:  e2.travel_time(),
                };
                let probability = self.model.probability(&query);
                if probability < self.probability_threshold {
                    continue;
                }
                best = Some(Encounter {
                    tail: e1.tail,
                    head: e1.head,
                    edge_length: e1.length,
                    time,
                    delay: time - threshold,
                    probability,
                    offset,
                });
            }
        }
        best
    }

    /// First instant in the overlap of both occupancy windows (and not before
    /// `not_before`) at which the vehicles are within range, with vehicle 1's
    /// offset from the tail at that instant.
    fn meeting_point(
        &self,
        e1:         &TrajectoryEdge,
        e2:         &TrajectoryEdge,
        reverse:    bool,
        not_before: SimTime,
    ) -> Option<(SimTime, f64)> {
        let lo = e1.enter.max(e2.enter).max(not_before);
        let hi = e1.exit.min(e2.exit);
        if lo > hi {
            return None;
        }

        // Signed separation in vehicle 1's tail frame; linear on [lo, hi].
        let gap = |t: SimTime| {
            let x2 = if reverse { e2.length - e2.offset_at(t) } else { e2.offset_at(t) };
            e1.offset_at(t) - x2
        };
        let range = self.communication_range;
        let g_lo = gap(lo);

        let t = if g_lo.abs() <= range {
            lo
        } else {
            let span = hi - lo;
            if span <= 0.0 {
                return None;
            }
            let slope = (gap(hi) - g_lo) / span;
            let target = if g_lo > 0.0 { range } else { -range };
            // Moving toward the band only if the gap shrinks in magnitude.
            if slope == 0.0 || (g_lo > 0.0) == (slope > 0.0) {
                return None;
            }
            let dt = (target - g_lo) / slope;
            if dt > span {
                return None;
            }
            lo.offset(dt)
        };
        Some((t, e1.offset_at(t)))
    }
}

impl<M: MeetingProbability> EncounterOracle for TrajectoryOracle<'_, M> {
    fn encounter_after(
        &self,
        current:    VehicleId,
        other:      VehicleId,
        threshold:  SimTime,
        not_before: SimTime,
    ) -> Option<Encounter> {
        if current == other {
            return None;
        }
        let v1 = self.fleet.get(current)?;
        let v2 = self.fleet.get(other)?;
        let found = self.earliest(v1, v2, threshold, not_before.max(threshold));
        if let Some(e) = &found {
            trace!(
                %current, %other,
                time = e.time.secs(),
                probability = e.probability,
                "predicted encounter"
            );
        }
        found
    }

    /// Applies the configured causality margin on top of `threshold`.
    fn encounter(&self, current: VehicleId, other: VehicleId, threshold: SimTime) -> Option<Encounter> {
        self.encounter_after(current, other, threshold, threshold.offset(self.causality_margin))
    }
}
