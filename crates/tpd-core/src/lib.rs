//! `tpd-core` — foundational types for the TPD forwarding workspace.
//!
//! This crate is a dependency of every other `tpd-*` crate.  It has no
//! `tpd-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `VehicleId`, `NodeId`, `EdgeId`, `PacketId`           |
//! | [`geo`]         | `Point` (planar metres), euclidean distance           |
//! | [`time`]        | `SimTime`: totally ordered simulation seconds         |
//! | [`config`]      | `TpdConfig`, `ForwardingType`, `RoutingMode`, `EdrVariant` |
//! | [`rng`]         | `VehicleRng` (per-vehicle deterministic RNG)          |
//! | [`error`]       | `TpdError`, `TpdResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{EdrVariant, ForwardingType, RoutingMode, TpdConfig};
pub use error::{TpdError, TpdResult};
pub use geo::Point;
pub use ids::{EdgeId, NodeId, PacketId, VehicleId};
pub use rng::VehicleRng;
pub use time::SimTime;
