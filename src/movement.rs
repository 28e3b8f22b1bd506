//! Per-direction vehicle bookkeeping and the kinematics pass.

use crate::controller::SignalController;
use crate::direction::{Direction, PerDirection};
use crate::intersection::Intersection;
use crate::road::STOP_LINE_SETBACK;
use crate::vehicle::{Leader, Vehicle, VehicleId, VehicleStatus};
use std::collections::HashMap;

/// Extra distance past the approach entry before a vehicle is evicted, in m.
const EXIT_MARGIN: f64 = 50.0; // m

/// Owns the live vehicles and runs the car-following pass each step.
///
/// Vehicles live in a map for id lookup, with a per-direction id list that
/// fixes iteration order. Every order-sensitive traversal walks the lists
/// in canonical direction order so a run is reproducible.
pub struct MovementSystem {
    vehicles: HashMap<VehicleId, Vehicle>,
    by_direction: PerDirection<Vec<VehicleId>>,
}

impl MovementSystem {
    pub fn new() -> Self {
        Self {
            vehicles: HashMap::new(),
            by_direction: PerDirection::from_fn(|_| Vec::new()),
        }
    }

    /// Takes ownership of a newly generated vehicle.
    pub fn add_vehicle(&mut self, vehicle: Vehicle) {
        self.by_direction[vehicle.direction()].push(vehicle.id());
        self.vehicles.insert(vehicle.id(), vehicle);
    }

    /// Removes a vehicle, returning it if it was present.
    pub fn remove_vehicle(&mut self, id: VehicleId) -> Option<Vehicle> {
        let vehicle = self.vehicles.remove(&id)?;
        let ids = &mut self.by_direction[vehicle.direction()];
        if let Some(index) = ids.iter().position(|v| *v == id) {
            ids.remove(index);
        }
        Some(vehicle)
    }

    /// Runs one kinematics pass over every vehicle.
    ///
    /// Each direction's vehicles are sorted by remaining distance to the
    /// center and updated front to back, so a follower reacts to its
    /// leader's state from this step. Vehicles inside the conflict area
    /// after moving are marked crossing; the status stays until eviction.
    pub fn update_all(&mut self, dt: f64, intersection: &Intersection, signals: &SignalController) {
        for dir in Direction::ALL {
            let road = match intersection.road(dir) {
                Some(road) => road,
                None => continue,
            };

            let mut ids = std::mem::take(&mut self.by_direction[dir]);
            ids.sort_by(|a, b| {
                let da = road.distance_from_center(self.vehicles[a].position());
                let db = road.distance_from_center(self.vehicles[b].position());
                da.total_cmp(&db)
            });

            let stop_line_distance = intersection.width() / 2.0 + STOP_LINE_SETBACK;
            let phase = signals.phase(dir);
            let bounds = intersection.bounds();

            for i in 0..ids.len() {
                let vehicle = &self.vehicles[&ids[i]];

                // Nearest same-lane vehicle ahead, already updated this step.
                let leader = ids[..i]
                    .iter()
                    .rev()
                    .map(|id| &self.vehicles[id])
                    .find(|v| v.lane() == vehicle.lane())
                    .map(|v| Leader {
                        position: v.position(),
                        velocity: v.velocity(),
                        length: v.length(),
                    });

                let distance = road.distance_from_center(vehicle.position());
                let signal_distance = (distance - stop_line_distance).max(0.0);

                let vehicle = self
                    .vehicles
                    .get_mut(&ids[i])
                    .unwrap_or_else(|| panic!("vehicle disappeared: {}", ids[i]));
                vehicle.update(dt, leader.as_ref(), signal_distance, phase);

                if vehicle.is_in_intersection(&bounds) {
                    vehicle.set_status(VehicleStatus::Crossing);
                }
            }

            self.by_direction[dir] = ids;
        }
    }

    /// Evicts every vehicle that has left the simulated region, in
    /// canonical direction order. Evicted vehicles are marked exited.
    pub fn remove_exited(&mut self, intersection: &Intersection) -> Vec<Vehicle> {
        let boundary = intersection.approach_length() + EXIT_MARGIN;

        let mut exited = Vec::new();
        for dir in Direction::ALL {
            let ids: Vec<VehicleId> = self.by_direction[dir]
                .iter()
                .copied()
                .filter(|id| self.vehicles[id].is_outside_bounds(boundary))
                .collect();
            for id in ids {
                if let Some(mut vehicle) = self.remove_vehicle(id) {
                    vehicle.set_status(VehicleStatus::Exited);
                    exited.push(vehicle);
                }
            }
        }
        exited
    }

    /// The number of vehicles currently waiting on an approach.
    pub fn queue_length(&self, direction: Direction) -> u32 {
        self.by_direction[direction]
            .iter()
            .filter(|id| self.vehicles[*id].status() == VehicleStatus::Waiting)
            .count() as u32
    }

    /// The number of live vehicles on an approach.
    pub fn count(&self, direction: Direction) -> usize {
        self.by_direction[direction].len()
    }

    /// The total number of live vehicles.
    pub fn total_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn get(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    /// Every live vehicle, in canonical direction order and within a
    /// direction in the last kinematics pass's front-to-back order.
    pub fn ordered_vehicles(&self) -> Vec<&Vehicle> {
        Direction::ALL
            .iter()
            .flat_map(|dir| self.by_direction[*dir].iter())
            .map(|id| &self.vehicles[id])
            .collect()
    }

    /// Removes every vehicle.
    pub fn reset(&mut self) {
        self.vehicles.clear();
        for dir in Direction::ALL {
            self.by_direction[dir].clear();
        }
    }
}

impl Default for MovementSystem {
    fn default() -> Self {
        Self::new()
    }
}
