//! Mathematical structs and functions.

use cgmath::{Point2, Vector2};

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;

/// Computes the Euclidean distance between two points.
pub fn distance(a: Point2d, b: Point2d) -> f64 {
    use cgmath::MetricSpace;
    a.distance(b)
}

/// Computes the midpoint of two points.
pub fn midpoint(a: Point2d, b: Point2d) -> Point2d {
    Point2d::new(0.5 * (a.x + b.x), 0.5 * (a.y + b.y))
}
