use thiserror::Error;

use tpd_core::{PacketId, SimTime, VehicleId};
use tpd_graph::GraphError;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("encounter graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("packet {packet} expired at {expired_at}")]
    PacketExpired { packet: PacketId, expired_at: SimTime },

    #[error("packet {0} carries no encounter graph")]
    NotSourceRouted(PacketId),

    #[error("carrier {0} has no known position")]
    CarrierNotLocated(VehicleId),

    #[error("{candidate} is not a child of {carrier} in the packet's encounter graph")]
    NotAChild { carrier: VehicleId, candidate: VehicleId },
}

pub type ForwardResult<T> = Result<T, ForwardError>;
