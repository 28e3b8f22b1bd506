//! Collision and near-miss detection.

use crate::intersection::Intersection;
use crate::math::{distance, midpoint, Point2d};
use crate::vehicle::{Vehicle, VehicleId};
use crate::direction::TurnIntent;
use itertools::Itertools;
use log::warn;

/// Pair distance below which an event counts as a collision, in m.
const COLLISION_THRESHOLD: f64 = 1.0; // m

/// Pair distance below which an event counts as a near miss, in m.
const MIN_SAFE_DISTANCE: f64 = 2.0; // m

/// How far back in the event log the duplicate check looks.
const DEDUP_WINDOW: usize = 10;

/// The same pair is not logged again within this interval, in s.
const DEDUP_INTERVAL: f64 = 1.0; // s

/// How bad a [CollisionEvent] was.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ConflictSeverity {
    NearMiss,
    Collision,
}

/// Two vehicles came dangerously close.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollisionEvent {
    pub time: f64,
    pub first: VehicleId,
    pub second: VehicleId,
    /// The midpoint between the two vehicles when the event fired.
    pub location: Point2d,
    pub severity: ConflictSeverity,
}

impl CollisionEvent {
    fn involves_pair(&self, a: VehicleId, b: VehicleId) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

/// Watches vehicle pairs for dangerous proximity and keeps the event log.
///
/// Detection is purely observational. Nothing here feeds back into the
/// kinematics; a detected conflict changes the log, not the vehicles.
pub struct ConflictMonitor {
    events: Vec<CollisionEvent>,
}

impl ConflictMonitor {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Checks every unordered vehicle pair once. Callers pass the vehicles
    /// in a deterministic order so the event log is reproducible.
    pub fn scan(&mut self, vehicles: &[&Vehicle], now: f64) {
        for (a, b) in vehicles.iter().tuple_combinations() {
            self.check_pair(a, b, now);
        }
    }

    fn check_pair(&mut self, a: &Vehicle, b: &Vehicle, now: f64) {
        let separation = distance(a.position(), b.position());

        let severity = if separation < COLLISION_THRESHOLD {
            ConflictSeverity::Collision
        } else if separation < MIN_SAFE_DISTANCE && a.direction() != b.direction() {
            // Same-direction vehicles queue close together; only converging
            // streams make a short gap an incident.
            ConflictSeverity::NearMiss
        } else {
            return;
        };

        self.log_event(CollisionEvent {
            time: now,
            first: a.id(),
            second: b.id(),
            location: midpoint(a.position(), b.position()),
            severity,
        });
    }

    /// Appends an event unless the same pair fired within the dedup
    /// interval, judged against the last few logged events.
    fn log_event(&mut self, event: CollisionEvent) {
        let start = self.events.len().saturating_sub(DEDUP_WINDOW);
        let recent = self.events[start..]
            .iter()
            .find(|e| e.involves_pair(event.first, event.second));

        if let Some(recent) = recent {
            if event.time - recent.time < DEDUP_INTERVAL {
                return;
            }
        }

        if event.severity == ConflictSeverity::Collision {
            warn!(
                "collision at t={:.2}s: {} <-> {}",
                event.time, event.first, event.second
            );
        }
        self.events.push(event);
    }

    /// Advisory check: could the vehicle enter the conflict area without
    /// crossing the path of a vehicle already inside it?
    pub fn is_safe_to_enter_intersection(
        &self,
        vehicle: &Vehicle,
        others: &[&Vehicle],
        intersection: &Intersection,
    ) -> bool {
        let bounds = intersection.bounds();
        !others.iter().any(|other| {
            other.id() != vehicle.id()
                && other.is_in_intersection(&bounds)
                && paths_conflict(vehicle, other)
        })
    }

    /// The full event log, oldest first.
    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    /// The number of logged collisions.
    pub fn collision_count(&self) -> usize {
        self.count(ConflictSeverity::Collision)
    }

    /// The number of logged near misses.
    pub fn near_miss_count(&self) -> usize {
        self.count(ConflictSeverity::NearMiss)
    }

    fn count(&self, severity: ConflictSeverity) -> usize {
        self.events.iter().filter(|e| e.severity == severity).count()
    }

    /// Clears the event log.
    pub fn reset(&mut self) {
        self.events.clear();
    }
}

impl Default for ConflictMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the planned paths of two vehicles can cross inside the
/// conflict area.
fn paths_conflict(a: &Vehicle, b: &Vehicle) -> bool {
    if a.direction() == b.direction() {
        return false;
    }

    if a.direction().is_opposite(b.direction()) {
        // Opposing streams only meet when someone turns across.
        return a.turn_intent() == TurnIntent::Left || b.turn_intent() == TurnIntent::Left;
    }

    a.direction().is_perpendicular(b.direction())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::direction::Direction;

    fn vehicle(
        id: u64,
        direction: Direction,
        turn_intent: TurnIntent,
        position: Point2d,
    ) -> Vehicle {
        let defaults = SimulationConfig::default().vehicle_defaults;
        Vehicle::new(VehicleId(id), direction, turn_intent, 0, position, &defaults)
    }

    #[test]
    fn close_pair_is_a_collision() {
        let mut monitor = ConflictMonitor::new();
        let a = vehicle(1, Direction::North, TurnIntent::Straight, Point2d::new(0.0, 0.0));
        let b = vehicle(2, Direction::East, TurnIntent::Straight, Point2d::new(0.5, 0.0));
        monitor.scan(&[&a, &b], 10.0);

        assert_eq!(monitor.collision_count(), 1);
        let event = &monitor.events()[0];
        assert_eq!(event.severity, ConflictSeverity::Collision);
        assert_eq!(event.location, Point2d::new(0.25, 0.0));
    }

    #[test]
    fn near_miss_requires_differing_directions() {
        let mut monitor = ConflictMonitor::new();
        // Same direction, 1.5 m apart: a queue, not an incident.
        let a = vehicle(1, Direction::North, TurnIntent::Straight, Point2d::new(0.0, 0.0));
        let b = vehicle(2, Direction::North, TurnIntent::Straight, Point2d::new(0.0, 1.5));
        monitor.scan(&[&a, &b], 10.0);
        assert!(monitor.events().is_empty());

        // Crossing streams at the same separation are a near miss.
        let c = vehicle(3, Direction::East, TurnIntent::Straight, Point2d::new(0.0, 1.5));
        monitor.scan(&[&a, &c], 10.0);
        assert_eq!(monitor.near_miss_count(), 1);
    }

    #[test]
    fn same_direction_collisions_still_count() {
        let mut monitor = ConflictMonitor::new();
        let a = vehicle(1, Direction::North, TurnIntent::Straight, Point2d::new(0.0, 0.0));
        let b = vehicle(2, Direction::North, TurnIntent::Straight, Point2d::new(0.0, 0.5));
        monitor.scan(&[&a, &b], 10.0);
        assert_eq!(monitor.collision_count(), 1);
    }

    #[test]
    fn duplicate_pair_is_suppressed_within_a_second() {
        let mut monitor = ConflictMonitor::new();
        let a = vehicle(1, Direction::North, TurnIntent::Straight, Point2d::new(0.0, 0.0));
        let b = vehicle(2, Direction::East, TurnIntent::Straight, Point2d::new(0.5, 0.0));

        monitor.scan(&[&a, &b], 10.0);
        monitor.scan(&[&a, &b], 10.5);
        assert_eq!(monitor.collision_count(), 1);

        // Swapped order is the same pair.
        monitor.scan(&[&b, &a], 10.9);
        assert_eq!(monitor.collision_count(), 1);

        monitor.scan(&[&a, &b], 11.0);
        assert_eq!(monitor.collision_count(), 2);
    }

    #[test]
    fn paths_conflict_by_geometry() {
        let p = Point2d::new(0.0, 0.0);
        let north_straight = vehicle(1, Direction::North, TurnIntent::Straight, p);
        let north_left = vehicle(2, Direction::North, TurnIntent::Left, p);
        let south_straight = vehicle(3, Direction::South, TurnIntent::Straight, p);
        let south_right = vehicle(4, Direction::South, TurnIntent::Right, p);
        let east_straight = vehicle(5, Direction::East, TurnIntent::Straight, p);

        // Opposing straights pass each other.
        assert!(!paths_conflict(&north_straight, &south_straight));
        // A left turn crosses the opposing stream.
        assert!(paths_conflict(&north_left, &south_straight));
        assert!(paths_conflict(&south_straight, &north_left));
        // Opposing right turns diverge.
        assert!(!paths_conflict(&north_straight, &south_right));
        // Perpendicular streams always conflict.
        assert!(paths_conflict(&north_straight, &east_straight));
        // Same direction never conflicts.
        assert!(!paths_conflict(&north_straight, &north_left));
    }

    #[test]
    fn entry_is_unsafe_while_a_crossing_path_occupies_the_box() {
        let monitor = ConflictMonitor::new();
        let intersection = Intersection::new(&SimulationConfig::default().intersection);

        let candidate = vehicle(1, Direction::North, TurnIntent::Straight, Point2d::new(-1.75, -16.0));
        let inside = vehicle(2, Direction::East, TurnIntent::Straight, Point2d::new(0.0, -1.75));
        let outside = vehicle(3, Direction::East, TurnIntent::Straight, Point2d::new(-50.0, -1.75));

        assert!(!monitor.is_safe_to_enter_intersection(&candidate, &[&inside], &intersection));
        assert!(monitor.is_safe_to_enter_intersection(&candidate, &[&outside], &intersection));

        // An opposing straight inside the box does not block entry.
        let opposing = vehicle(4, Direction::South, TurnIntent::Straight, Point2d::new(1.75, 2.0));
        assert!(monitor.is_safe_to_enter_intersection(&candidate, &[&opposing], &intersection));
    }
}
