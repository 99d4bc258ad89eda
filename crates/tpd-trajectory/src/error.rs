use thiserror::Error;

use tpd_core::VehicleId;
use tpd_spatial::SpatialError;

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("trajectory parse error: {0}")]
    Parse(String),

    #[error("invalid trajectory for {vehicle}: {reason}")]
    Invalid { vehicle: VehicleId, reason: String },

    #[error("vehicle {0} is not in the fleet")]
    VehicleNotFound(VehicleId),

    #[error("road network error: {0}")]
    Spatial(#[from] SpatialError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TrajectoryResult<T> = Result<T, TrajectoryError>;
