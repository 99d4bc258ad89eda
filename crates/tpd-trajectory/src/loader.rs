//! CSV trajectory loader.
//!
//! # CSV format
//!
//! One row per path node.  Rows for the same vehicle appear in travel order;
//! the vehicle-level columns (`speed`, `unit_mean`, `unit_variance`) are read
//! from the vehicle's first row.
//!
//! ```csv
//! vehicle_id,vertex,arrival_time,edge_length,speed,unit_mean,unit_variance
//! 0,3,0.0,100.0,10.0,0.1,0.0
//! 0,4,10.0,250.0,10.0,0.1,0.0
//! 0,7,35.0,0.0,10.0,0.1,0.0
//! 1,4,5.0,0.0,12.0,0.0833,0.0004
//! ```
//!
//! `edge_length` on the last row of a vehicle is ignored (forced to 0).
//! Vertices are not checked against a road network here; the encounter
//! oracle only compares vertex ids between trajectories.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use tpd_core::{NodeId, SimTime, VehicleId};

use crate::{PathNode, Trajectory, TrajectoryError, TravelTimeStats, Vehicle, VehicleFleet};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TrajectoryRecord {
    vehicle_id:    u32,
    vertex:        u32,
    arrival_time:  f64,
    edge_length:   f64,
    speed:         f64,
    unit_mean:     f64,
    unit_variance: f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a [`VehicleFleet`] from a CSV file.
pub fn load_fleet_csv(path: &Path) -> Result<VehicleFleet, TrajectoryError> {
    let file = std::fs::File::open(path)?;
    load_fleet_reader(file)
}

/// Like [`load_fleet_csv`] but accepts any `Read` source.
pub fn load_fleet_reader<R: Read>(reader: R) -> Result<VehicleFleet, TrajectoryError> {
    // ── Parse CSV rows ────────────────────────────────────────────────────
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut by_vehicle: BTreeMap<u32, Vec<TrajectoryRecord>> = BTreeMap::new();

    for result in csv_reader.deserialize::<TrajectoryRecord>() {
        let row = result.map_err(|e| TrajectoryError::Parse(e.to_string()))?;
        by_vehicle.entry(row.vehicle_id).or_default().push(row);
    }

    // ── Build one Vehicle per id ──────────────────────────────────────────
    let capacity = by_vehicle.keys().next_back().map_or(0, |&id| id as usize + 1);
    let mut fleet = VehicleFleet::with_capacity(capacity);

    for (raw_id, rows) in by_vehicle {
        let id = VehicleId(raw_id);
        let first = &rows[0];
        if !(first.speed > 0.0) {
            return Err(TrajectoryError::Invalid {
                vehicle: id,
                reason:  format!("speed must be positive, got {}", first.speed),
            });
        }
        if !(first.unit_mean > 0.0) || !(first.unit_variance >= 0.0) {
            return Err(TrajectoryError::Invalid {
                vehicle: id,
                reason:  "travel-time statistics must have positive mean and non-negative variance"
                    .into(),
            });
        }
        let speed = first.speed;
        let stats = TravelTimeStats {
            unit_mean:     first.unit_mean,
            unit_variance: first.unit_variance,
        };

        let last = rows.len() - 1;
        let nodes: Vec<PathNode> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| PathNode {
                vertex:       NodeId(r.vertex),
                arrival_time: SimTime(r.arrival_time),
                edge_length:  if i == last { 0.0 } else { r.edge_length },
            })
            .collect();

        let trajectory = Trajectory::new(id, nodes)?;
        fleet.insert(Vehicle::new(id, speed, trajectory, stats));
    }

    debug!(vehicles = fleet.len(), "loaded fleet from CSV");
    Ok(fleet)
}
