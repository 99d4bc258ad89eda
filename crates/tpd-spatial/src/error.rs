use thiserror::Error;

use tpd_core::NodeId;

#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("intersection {0} is not part of the road network")]
    NodeNotFound(NodeId),

    #[error("no road leads from {from} to {to}")]
    NoEdge { from: NodeId, to: NodeId },

    #[error("{to} is unreachable from {from}")]
    NoRoute { from: NodeId, to: NodeId },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
