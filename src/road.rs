//! Approach road geometry.

use crate::direction::Direction;
use crate::math::{Point2d, Vector2d};
use cgmath::prelude::*;

/// Distance from the edge of the conflict area to the stop line, in m.
pub(crate) const STOP_LINE_SETBACK: f64 = 5.0; // m

/// An approach road leading into the intersection from one direction.
///
/// Immutable after construction. All coordinate queries are derived from
/// the direction's lookup tables; positions are expressed in a frame whose
/// origin is the intersection center.
#[derive(Clone, Debug)]
pub struct Road {
    direction: Direction,
    num_lanes: u32,
    length: f64,
    lane_width: f64,
}

impl Road {
    /// Creates a new road.
    pub fn new(direction: Direction, num_lanes: u32, length: f64, lane_width: f64) -> Self {
        Self {
            direction,
            num_lanes,
            length,
            lane_width,
        }
    }

    /// The direction this road approaches from.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The number of lanes.
    pub fn num_lanes(&self) -> u32 {
        self.num_lanes
    }

    /// The approach length in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The width of a single lane in m.
    pub fn lane_width(&self) -> f64 {
        self.lane_width
    }

    /// The total paved width in m.
    pub fn total_width(&self) -> f64 {
        self.num_lanes as f64 * self.lane_width
    }

    /// The centerline position of a lane at the given distance from the
    /// intersection center.
    ///
    /// # Panics
    /// Panics if `lane` is out of range.
    pub fn lane_position(&self, lane: u32, distance: f64) -> Point2d {
        assert!(
            lane < self.num_lanes,
            "invalid lane index: {} (num lanes: {})",
            lane,
            self.num_lanes
        );

        let lane_offset = (lane as f64 - (self.num_lanes as f64 - 1.0) / 2.0) * self.lane_width;
        let offset: Vector2d =
            lane_offset * self.direction.lane_axis() - distance * self.direction.unit_vector();
        Point2d::new(0.0, 0.0) + offset
    }

    /// The position where vehicles enter the approach.
    pub fn entry_position(&self, lane: u32) -> Point2d {
        self.lane_position(lane, self.length)
    }

    /// The stop line position for a lane.
    pub fn stop_line_position(&self, lane: u32, intersection_width: f64) -> Point2d {
        self.lane_position(lane, intersection_width / 2.0 + STOP_LINE_SETBACK)
    }

    /// Projects a position onto the approach axis, as a scalar distance
    /// from the intersection center. Negative once a vehicle has passed
    /// the center.
    pub fn distance_from_center(&self, position: Point2d) -> f64 {
        -position.to_vec().dot(self.direction.unit_vector())
    }

    /// Whether the position lies on the paved approach.
    pub fn is_on_road(&self, position: Point2d, intersection_width: f64) -> bool {
        let along = self.distance_from_center(position);
        let lateral = position.to_vec().dot(self.direction.lane_axis());
        along >= intersection_width / 2.0
            && along <= self.length
            && lateral.abs() <= self.total_width() / 2.0
    }
}
