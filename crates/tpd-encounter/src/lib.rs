//! `tpd-encounter` — predicts when two vehicles will share a road segment.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`probability`] | `MeetingQuery`, `MeetingProbability`, `GaussianMeetingModel` |
//! | [`oracle`]      | `Encounter`, `EncounterOracle`, `LiveVehicles`, `TrajectoryOracle` |
//! | [`scripted`]    | `ScriptedOracle`: table-driven meetings                    |
//!
//! The encounter graph builder in `tpd-graph` only sees the two traits
//! [`EncounterOracle`] and [`LiveVehicles`].  [`TrajectoryOracle`] is the
//! stock implementation that compares predicted trajectories from a
//! `VehicleFleet`; [`ScriptedOracle`] serves callers whose meetings come
//! from elsewhere.

pub mod oracle;
pub mod probability;
pub mod scripted;


pub use oracle::{Encounter, EncounterOracle, LiveVehicles, TrajectoryOracle};
pub use probability::{normal_cdf, GaussianMeetingModel, MeetingProbability, MeetingQuery};
pub use scripted::ScriptedOracle;
