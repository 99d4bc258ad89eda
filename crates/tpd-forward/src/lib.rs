//! `tpd-forward` — moving packets between vehicles.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                          |
//! |--------------|-------------------------------------------------------------------|
//! | [`packet`]   | `Packet`: carrier cursor, TTL, optional frozen encounter graph    |
//! | [`contact`]  | `ContactIndex`, `VehicleLocation`: R-tree range queries           |
//! | [`selector`] | `NextCarrierSelector`, `DeliveryEstimator`, `EngineEstimator`     |
//! | [`metrics`]  | `MetricsBoard`: last computed EDR/EDD per vehicle                 |
//! | [`error`]    | `ForwardError`, `ForwardResult<T>`                                |
//!
//! # Per-tick flow
//!
//! ```text
//! ContactIndex::build(network, fleet, now)
//!   └─ for each packet:
//!        NextCarrierSelector::select(estimator, packet, now)
//!          ├─ greedy: fresh EDR/EDD per candidate, strictly smaller EDD wins
//!          └─ source: children of the carrier in the packet's frozen graph
//! ```

pub mod contact;
pub mod error;
pub mod metrics;
pub mod packet;
pub mod selector;

#[cfg(test)]
mod tests;

pub use contact::{ContactIndex, VehicleLocation};
pub use error::{ForwardError, ForwardResult};
pub use metrics::{MetricsBoard, VehicleMetrics};
pub use packet::Packet;
pub use selector::{DeliveryEstimator, EngineEstimator, Handoff, NextCarrierSelector};
