//! `tpd-spatial` — the road network vehicles drive on.
//!
//! Intersections are planar points; roads are directed edges with a length
//! in metres.  A two-way road is simply a pair of opposite edges, which is
//! what the next-carrier selector relies on when it searches "both sides"
//! of a segment.
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`network`] | `RoadNetwork` (outgoing + incoming CSR, R-tree), its builder     |
//! | [`router`]  | `Router`, `DijkstraRouter`, `Route`                             |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                              |
//!
//! The `serde` feature forwards to `tpd-core/serde`.

pub mod error;
pub mod network;
pub mod router;


pub use error::{SpatialError, SpatialResult};
pub use network::{RoadNetwork, RoadNetworkBuilder};
pub use router::{DijkstraRouter, Route, Router};
