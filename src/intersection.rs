//! The intersection: static geometry tying the approach roads together.

use crate::config::{IntersectionConfig, IntersectionKind};
use crate::direction::{Direction, PerDirection};
use crate::math::Point2d;
use crate::road::Road;
use log::warn;

/// The square conflict area at the center of the intersection.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    /// Whether the point lies within the bounds (inclusive).
    pub fn contains(&self, position: Point2d) -> bool {
        position.x >= self.x_min
            && position.x <= self.x_max
            && position.y >= self.y_min
            && position.y <= self.y_max
    }
}

/// A signal-controlled intersection and its approach roads.
///
/// Immutable after construction; the origin of the coordinate frame is
/// the intersection center.
pub struct Intersection {
    kind: IntersectionKind,
    width: f64,
    approach_length: f64,
    roads: PerDirection<Option<Road>>,
    bounds: Bounds,
}

impl Intersection {
    /// Builds the intersection from its configuration.
    ///
    /// Only directions with a non-zero lane count get a road. A three-way
    /// intersection that doesn't end up with exactly three roads is
    /// flagged, not fatal.
    pub fn new(config: &IntersectionConfig) -> Self {
        let roads = PerDirection::from_fn(|dir| {
            let num_lanes = config.num_lanes[dir];
            (num_lanes > 0).then(|| {
                Road::new(dir, num_lanes, config.approach_length, config.lane_width)
            })
        });

        let num_roads = roads.iter().filter(|(_, r)| r.is_some()).count();
        if config.kind == IntersectionKind::ThreeWay && num_roads != 3 {
            warn!(
                "three-way intersection should have exactly 3 roads, but has {}",
                num_roads
            );
        }

        let half = config.width / 2.0;
        Self {
            kind: config.kind,
            width: config.width,
            approach_length: config.approach_length,
            roads,
            bounds: Bounds {
                x_min: -half,
                x_max: half,
                y_min: -half,
                y_max: half,
            },
        }
    }

    /// The intersection shape.
    pub fn kind(&self) -> IntersectionKind {
        self.kind
    }

    /// The width of the conflict area in m.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The length of each approach in m.
    pub fn approach_length(&self) -> f64 {
        self.approach_length
    }

    /// The square conflict area.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The road approaching from `direction`, if that approach is active.
    pub fn road(&self, direction: Direction) -> Option<&Road> {
        self.roads[direction].as_ref()
    }

    /// The active directions, in canonical order.
    pub fn active_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        self.roads
            .iter()
            .filter(|(_, road)| road.is_some())
            .map(|(dir, _)| dir)
    }

    /// Whether `direction` has an active approach.
    pub fn is_active(&self, direction: Direction) -> bool {
        self.roads[direction].is_some()
    }

    /// The entry position for a direction's approach.
    ///
    /// # Panics
    /// Panics if the direction has no road.
    pub fn entry_position(&self, direction: Direction, lane: u32) -> Point2d {
        self.require_road(direction).entry_position(lane)
    }

    /// The stop line position for a direction's approach.
    ///
    /// # Panics
    /// Panics if the direction has no road.
    pub fn stop_line_position(&self, direction: Direction, lane: u32) -> Point2d {
        self.require_road(direction).stop_line_position(lane, self.width)
    }

    /// Where the direction's traffic light stands, beside the stop line.
    ///
    /// # Panics
    /// Panics if the direction has no road.
    pub fn traffic_light_position(&self, direction: Direction) -> Point2d {
        self.stop_line_position(direction, 0) + 5.0 * direction.lane_axis()
    }

    fn require_road(&self, direction: Direction) -> &Road {
        self.roads[direction]
            .as_ref()
            .unwrap_or_else(|| panic!("no road for direction: {}", direction))
    }
}
