//! `tpd-graph` — the predicted encounter graph and its EDR/EDD resolution.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`frontier`] | `Frontier`, `FrontierEntry`, `ParentLink`                     |
//! | [`graph`]    | `EncounterGraph`, `GraphNode`, `EncounterEdge`                |
//! | [`builder`]  | `GraphBuilder`, `BuildReport`: best-first construction        |
//! | [`pruner`]   | `prune`, `PruneReport`: reference-count mark and sweep        |
//! | [`resolver`] | `resolution_order`, `resolve_edr`, `resolve_edd`, DP helpers  |
//! | [`engine`]   | `TpdEngine`, `GraphWorkspace`, `DeliveryMetrics`, `RoutePlan` |
//! | [`error`]    | `GraphError`, `GraphResult<T>`                                |
//!
//! # Query lifecycle
//!
//! ```text
//! GraphWorkspace (reused)
//!   ① build   : frontier keyed on predicted encounter time
//!   ② prune   : drop nodes on no root → destination path
//!   ③ order   : children before parents
//!   ④ EDR     : full fan-out or optimal subsequence
//!   ⑤ EDD     : conditional on delivery
//!   ⑥ read    : root EDR/EDD, or snapshot the graph for a packet
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tpd_core::{SimTime, TpdConfig, VehicleId};
//! use tpd_encounter::ScriptedOracle;
//! use tpd_graph::{GraphWorkspace, TpdEngine};
//!
//! let mut oracle = ScriptedOracle::new();
//! oracle.meet(VehicleId(0), VehicleId(1), 10.0, 0.8);
//! let config = TpdConfig::default();
//! let engine = TpdEngine::new(&oracle, &oracle, &config);
//! let m = engine.compute_edr_and_edd(&mut GraphWorkspace::new(), SimTime::ZERO, VehicleId(0), VehicleId(1))?;
//! ```

pub mod builder;
pub mod engine;
pub mod error;
pub mod frontier;
pub mod graph;
pub mod pruner;
pub mod resolver;


pub use builder::{BuildReport, GraphBuilder};
pub use engine::{DeliveryMetrics, GraphWorkspace, RoutePlan, TpdEngine};
pub use error::{GraphError, GraphResult};
pub use frontier::{Frontier, FrontierEntry, ParentLink};
pub use graph::{EncounterEdge, EncounterGraph, GraphNode};
pub use pruner::{prune, PruneReport};
pub use resolver::{optimal_subsequence, resolution_order, resolve_edd, resolve_edr, sequence_edr, EDR_EPSILON};
