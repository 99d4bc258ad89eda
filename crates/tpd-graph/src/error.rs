use thiserror::Error;
use tracing::error;

use tpd_core::{TpdError, VehicleId};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Core(#[from] TpdError),

    #[error("destination {0} is not in the encounter graph")]
    DestinationMissing(VehicleId),

    #[error("inconsistent encounter graph at {vehicle}: {reason}")]
    Inconsistent { vehicle: VehicleId, reason: String },

    #[error("inconsistent encounter graph: {remaining} node(s) left unresolved")]
    Unresolved { remaining: usize },
}

impl GraphError {
    /// An invariant violation.  Logged at `error` level when constructed.
    pub(crate) fn inconsistent(vehicle: VehicleId, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        error!(%vehicle, %reason, "encounter graph invariant violated");
        GraphError::Inconsistent { vehicle, reason }
    }

    pub(crate) fn unresolved(remaining: usize) -> Self {
        error!(remaining, "encounter graph has nodes that never became resolvable");
        GraphError::Unresolved { remaining }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
