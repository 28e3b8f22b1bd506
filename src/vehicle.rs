//! A simulated vehicle and its car-following law.

use crate::config::VehicleDefaults;
use crate::direction::{Direction, TurnIntent};
use crate::intersection::Bounds;
use crate::light::SignalPhase;
use crate::math::{distance, Point2d};
use std::fmt;

/// Below this speed a vehicle counts as stopped, in m/s.
const WAITING_SPEED: f64 = 0.5; // m/s

/// Extra margin added to the stopping distance when deciding whether to
/// brake for a signal, in m.
const SIGNAL_STOP_MARGIN: f64 = 10.0; // m

/// Floor applied to the following gap before the quadratic braking term,
/// in m. Prevents division by a zero gap.
const MIN_BRAKING_GAP: f64 = 0.1; // m

/// Unique ID of a [Vehicle]. Ids increase monotonically within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{:04}", self.0)
    }
}

/// Where a vehicle is in its passage through the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VehicleStatus {
    Approaching,
    Waiting,
    Crossing,
    Exited,
}

/// A snapshot of the vehicle ahead, taken before the kinematics pass.
#[derive(Clone, Copy, Debug)]
pub struct Leader {
    pub position: Point2d,
    pub velocity: f64,
    pub length: f64,
}

/// The immutable record a vehicle leaves behind when it exits.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleRecord {
    pub id: VehicleId,
    pub entry_time: f64,
    pub exit_time: f64,
    pub total_travel_time: f64,
    pub wait_time: f64,
    pub direction: Direction,
    pub turn_intent: TurnIntent,
    pub peak_velocity: f64,
}

/// A simulated vehicle.
///
/// Created by the generator at an approach's entry position, mutated every
/// step by [update](Vehicle::update), and converted into a [VehicleRecord]
/// when the movement system evicts it.
#[derive(Clone, Debug)]
pub struct Vehicle {
    id: VehicleId,
    direction: Direction,
    turn_intent: TurnIntent,
    lane: u32,
    position: Point2d,
    /// The velocity in m/s.
    velocity: f64,
    /// The acceleration applied in the last update, in m/s^2.
    acceleration: f64,
    status: VehicleStatus,
    wait_time: f64,
    travel_time: f64,
    distance_travelled: f64,
    peak_velocity: f64,
    max_speed: f64,
    max_acceleration: f64,
    comfortable_deceleration: f64,
    min_gap: f64,
    reaction_time: f64,
    length: f64,
}

impl Vehicle {
    /// Creates a vehicle at rest at the given position.
    pub fn new(
        id: VehicleId,
        direction: Direction,
        turn_intent: TurnIntent,
        lane: u32,
        position: Point2d,
        defaults: &VehicleDefaults,
    ) -> Self {
        Self {
            id,
            direction,
            turn_intent,
            lane,
            position,
            velocity: 0.0,
            acceleration: 0.0,
            status: VehicleStatus::Approaching,
            wait_time: 0.0,
            travel_time: 0.0,
            distance_travelled: 0.0,
            peak_velocity: 0.0,
            max_speed: defaults.max_speed,
            max_acceleration: defaults.max_acceleration,
            comfortable_deceleration: defaults.comfortable_deceleration,
            min_gap: defaults.min_gap,
            reaction_time: defaults.reaction_time,
            length: defaults.length,
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn turn_intent(&self) -> TurnIntent {
        self.turn_intent
    }

    pub fn lane(&self) -> u32 {
        self.lane
    }

    /// The vehicle's position in world coordinates.
    pub fn position(&self) -> Point2d {
        self.position
    }

    /// The velocity in m/s.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// The acceleration applied in the last update, in m/s^2.
    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    /// Accumulated time spent below the waiting threshold, in s.
    pub fn wait_time(&self) -> f64 {
        self.wait_time
    }

    /// Accumulated simulated lifetime, in s.
    pub fn travel_time(&self) -> f64 {
        self.travel_time
    }

    /// Total distance travelled, in m.
    pub fn distance_travelled(&self) -> f64 {
        self.distance_travelled
    }

    /// The vehicle's length in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub(crate) fn set_status(&mut self, status: VehicleStatus) {
        self.status = status;
    }

    /// Advances the vehicle by one time step.
    ///
    /// # Parameters
    /// * `dt` - The time step in s.
    /// * `leader` - The nearest vehicle ahead in the same lane, if any.
    /// * `signal_distance` - Remaining distance to the stop line in m.
    /// * `signal_phase` - The color shown to this vehicle's approach.
    pub fn update(
        &mut self,
        dt: f64,
        leader: Option<&Leader>,
        signal_distance: f64,
        signal_phase: SignalPhase,
    ) {
        let target_speed = self.target_speed(leader, signal_distance, signal_phase);
        self.acceleration = self.plan_acceleration(target_speed, leader);

        self.velocity = (self.velocity + self.acceleration * dt).clamp(0.0, self.max_speed);
        let displacement = self.velocity * dt;
        self.position += displacement * self.direction.unit_vector();

        self.distance_travelled += displacement;
        self.travel_time += dt;
        self.peak_velocity = self.peak_velocity.max(self.velocity);

        if self.velocity < WAITING_SPEED {
            self.wait_time += dt;
            if self.status == VehicleStatus::Approaching {
                self.status = VehicleStatus::Waiting;
            }
        } else if self.status == VehicleStatus::Waiting {
            self.status = VehicleStatus::Approaching;
        }
    }

    /// The speed the vehicle tries to hold this step.
    fn target_speed(
        &self,
        leader: Option<&Leader>,
        signal_distance: f64,
        signal_phase: SignalPhase,
    ) -> f64 {
        let mut target = self.max_speed;

        if signal_phase != SignalPhase::Green {
            // Stop only if the stop line is still reachable with a
            // comfortable deceleration.
            if signal_distance < self.stopping_distance() + SIGNAL_STOP_MARGIN {
                target = 0.0;
            }
        }

        if let Some(leader) = leader {
            let gap = self.gap_to(leader);
            let safe_gap = self.min_gap + self.velocity * self.reaction_time;
            if gap <= safe_gap {
                target = target.min(leader.velocity);
            }
        }

        target
    }

    /// Simplified intelligent-driver acceleration.
    fn plan_acceleration(&self, target_speed: f64, leader: Option<&Leader>) -> f64 {
        let mut acceleration = if self.velocity < target_speed {
            self.max_acceleration * (1.0 - (self.velocity / self.max_speed).powi(4))
        } else {
            -self.comfortable_deceleration
        };

        if let Some(leader) = leader {
            let gap = self.gap_to(leader);
            let desired_gap = self.min_gap + self.velocity * self.reaction_time;
            if gap <= desired_gap {
                // Braking intensifies quadratically as the gap closes.
                let ratio = desired_gap / gap.max(MIN_BRAKING_GAP);
                let braking = -self.comfortable_deceleration * ratio * ratio;
                acceleration = acceleration.min(braking);
            }
        }

        acceleration
    }

    /// The comfortable stopping distance at the current speed, in m.
    fn stopping_distance(&self) -> f64 {
        if self.velocity <= 0.0 {
            return 0.0;
        }
        self.velocity * self.velocity / (2.0 * self.comfortable_deceleration)
    }

    /// The net gap to the vehicle ahead, floored at zero.
    fn gap_to(&self, leader: &Leader) -> f64 {
        (distance(self.position, leader.position) - leader.length).max(0.0)
    }

    /// Whether the vehicle is inside the intersection's conflict area.
    pub fn is_in_intersection(&self, bounds: &Bounds) -> bool {
        bounds.contains(self.position)
    }

    /// Whether the vehicle has left the simulated region.
    pub fn is_outside_bounds(&self, boundary_distance: f64) -> bool {
        self.position.x.abs() > boundary_distance || self.position.y.abs() > boundary_distance
    }

    /// Finalizes the vehicle into the record the data collector keeps.
    pub fn into_record(self, exit_time: f64) -> VehicleRecord {
        VehicleRecord {
            id: self.id,
            entry_time: exit_time - self.travel_time,
            exit_time,
            total_travel_time: self.travel_time,
            wait_time: self.wait_time,
            direction: self.direction,
            turn_intent: self.turn_intent,
            peak_velocity: self.peak_velocity,
        }
    }
}
