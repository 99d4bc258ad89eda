//! Workspace-wide base error type.
//!
//! Sub-crates define their own error enums and either convert `TpdError`
//! into one of their variants via `From` or keep it separate.

use thiserror::Error;

use crate::{EdgeId, NodeId, VehicleId};

/// The base error type for `tpd-core` and a common variant for sub-crates.
#[derive(Debug, Error)]
pub enum TpdError {
    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `tpd-core`.
pub type TpdResult<T> = Result<T, TpdError>;
