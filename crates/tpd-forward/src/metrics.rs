//! `MetricsBoard`: each vehicle's last computed EDR/EDD.
//!
//! This is the one piece of state shared between routing decisions.  Writers
//! take the lock for a single insert; readers never block each other.

use std::sync::{PoisonError, RwLock};

use rustc_hash::FxHashMap;

use tpd_core::{SimTime, VehicleId};
use tpd_graph::DeliveryMetrics;

/// One board entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleMetrics {
    pub destination: VehicleId,
    pub metrics:     DeliveryMetrics,
    pub computed_at: SimTime,
}

/// Thread-safe table of the latest [`VehicleMetrics`] per vehicle.
#[derive(Debug, Default)]
pub struct MetricsBoard {
    inner: RwLock<FxHashMap<VehicleId, VehicleMetrics>>,
}

impl MetricsBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite `vehicle`'s entry.
    pub fn record(&self, vehicle: VehicleId, destination: VehicleId, metrics: DeliveryMetrics, at: SimTime) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(vehicle, VehicleMetrics { destination, metrics, computed_at: at });
    }

    pub fn get(&self, vehicle: VehicleId) -> Option<VehicleMetrics> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&vehicle).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
