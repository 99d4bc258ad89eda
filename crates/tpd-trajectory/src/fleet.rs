//! The `VehicleFleet`: id-indexed storage of live vehicles.

use tpd_core::{SimTime, VehicleId};

use crate::{TrajectoryError, TrajectoryResult, Vehicle};

/// Every vehicle currently in the simulated world.
///
/// `slots` is indexed by `VehicleId`; an empty slot is a vehicle that is not
/// (or no longer) live.  [`capacity`](Self::capacity) is the maximum vehicle
/// count, which the encounter graph uses to size its presence map.
#[derive(Debug, Clone, Default)]
pub struct VehicleFleet {
    slots: Vec<Option<Vehicle>>,
    live:  usize,
}

impl VehicleFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { slots: Vec::with_capacity(capacity), live: 0 }
    }

    /// Insert or replace the vehicle stored under `vehicle.id`.
    pub fn insert(&mut self, vehicle: Vehicle) {
        let i = vehicle.id.index();
        if i >= self.slots.len() {
            self.slots.resize_with(i + 1, || None);
        }
        if self.slots[i].replace(vehicle).is_none() {
            self.live += 1;
        }
    }

    /// Remove a vehicle from the world, returning it if it was live.
    pub fn remove(&mut self, id: VehicleId) -> Option<Vehicle> {
        let taken = self.slots.get_mut(id.index())?.take();
        if taken.is_some() {
            self.live -= 1;
        }
        taken
    }

    #[inline]
    pub fn get(&self, id: VehicleId) -> Option<&Vehicle> {
        self.slots.get(id.index())?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    /// Like [`get`](Self::get) but reports an absent vehicle as an error.
    pub fn require(&self, id: VehicleId) -> TrajectoryResult<&Vehicle> {
        self.get(id).ok_or(TrajectoryError::VehicleNotFound(id))
    }

    #[inline]
    pub fn contains(&self, id: VehicleId) -> bool {
        self.get(id).is_some()
    }

    /// Live vehicles in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> + '_ {
        self.slots.iter().flatten()
    }

    pub fn ids(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.iter().map(|v| v.id)
    }

    /// Upper bound (exclusive) on live vehicle ids.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live vehicles.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Advance every vehicle's trajectory cursor to `now`.  Returns how many
    /// cursors moved.
    pub fn advance_all(&mut self, now: SimTime) -> usize {
        self.slots
            .iter_mut()
            .flatten()
            .map(|v| v.advance_to(now) as usize)
            .sum()
    }
}
