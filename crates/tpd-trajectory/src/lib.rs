//! `tpd-trajectory` — predicted vehicle trajectories and the live fleet.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | [`path`]      | `PathNode`, `Trajectory`, `TrajectoryEdge`, `TrajectoryPosition` |
//! | [`vehicle`]   | `TravelTimeStats`, `Vehicle`                                     |
//! | [`fleet`]     | `VehicleFleet`: id-indexed live vehicle storage                 |
//! | [`loader`]    | `load_fleet_csv`, `load_fleet_reader`                           |
//! | [`generator`] | `TrajectoryGenerator`: seeded random-walk and routed trajectories |
//! | [`error`]     | `TrajectoryError`, `TrajectoryResult<T>`                        |
//!
//! # Trajectory model
//!
//! A trajectory is the ordered list of intersections a vehicle is predicted
//! to pass, each with its expected arrival time and the length of the edge
//! to the next intersection.  A cursor marks the path node the vehicle most
//! recently passed; everything before it is history.
//!
//! Travel time over `d` metres is modelled as a sum of independent per-metre
//! increments, so its mean is `d · unit_mean` and its variance is
//! `d · unit_variance`.  The encounter oracle turns that into the arrival-time
//! spread used for meeting probabilities.

pub mod error;
pub mod fleet;
pub mod generator;
pub mod loader;
pub mod path;
pub mod vehicle;


pub use error::{TrajectoryError, TrajectoryResult};
pub use fleet::VehicleFleet;
pub use generator::{GeneratorParams, TrajectoryGenerator};
pub use loader::{load_fleet_csv, load_fleet_reader};
pub use path::{PathNode, Trajectory, TrajectoryEdge, TrajectoryPosition};
pub use vehicle::{TravelTimeStats, Vehicle};
