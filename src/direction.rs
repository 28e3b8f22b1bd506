//! Compass directions and per-direction lookup tables.

use crate::math::Vector2d;
use std::fmt;
use std::ops::{Index, IndexMut};

/// An approach direction into the intersection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    North,
    South,
    East,
    West,
}

/// The axis a direction travels along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

/// A vehicle's intended movement through the intersection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TurnIntent {
    Straight,
    Left,
    Right,
}

/// Unit vectors of travel, indexed by [Direction].
const UNIT_VECTORS: [Vector2d; 4] = [
    Vector2d::new(0.0, 1.0),  // north
    Vector2d::new(0.0, -1.0), // south
    Vector2d::new(1.0, 0.0),  // east
    Vector2d::new(-1.0, 0.0), // west
];

/// Direction of increasing lane index, indexed by [Direction].
const LANE_AXES: [Vector2d; 4] = [
    Vector2d::new(1.0, 0.0),
    Vector2d::new(-1.0, 0.0),
    Vector2d::new(0.0, 1.0),
    Vector2d::new(0.0, -1.0),
];

const OPPOSITES: [Direction; 4] = [
    Direction::South,
    Direction::North,
    Direction::West,
    Direction::East,
];

impl Direction {
    /// All directions, in the canonical iteration order used throughout
    /// the simulation. Iterating in this fixed order is what keeps
    /// per-step random draws reproducible.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// The index of this direction into the per-direction tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// A unit vector pointing in the direction of travel.
    #[inline]
    pub fn unit_vector(self) -> Vector2d {
        UNIT_VECTORS[self.index()]
    }

    /// A unit vector along which lane offsets grow.
    #[inline]
    pub fn lane_axis(self) -> Vector2d {
        LANE_AXES[self.index()]
    }

    /// The opposing direction.
    #[inline]
    pub fn opposite(self) -> Direction {
        OPPOSITES[self.index()]
    }

    /// The axis this direction travels along.
    pub fn axis(self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::NorthSouth,
            Direction::East | Direction::West => Axis::EastWest,
        }
    }

    /// Whether `other` approaches from the opposite direction.
    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }

    /// Whether `other` approaches at a right angle.
    pub fn is_perpendicular(self, other: Direction) -> bool {
        self.axis() != other.axis()
    }

    /// The lowercase name of the direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value stored for each of the four directions.
///
/// Indexing with a [Direction] replaces the four-way branching the
/// simulation would otherwise need whenever it touches per-direction state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerDirection<T> {
    values: [T; 4],
}

impl<T> PerDirection<T> {
    /// Creates a table from the given north, south, east, west values.
    pub const fn new(north: T, south: T, east: T, west: T) -> Self {
        Self {
            values: [north, south, east, west],
        }
    }

    /// Creates a table by evaluating `f` for each direction in canonical order.
    pub fn from_fn(mut f: impl FnMut(Direction) -> T) -> Self {
        Self {
            values: Direction::ALL.map(&mut f),
        }
    }

    /// Creates a table with the same value for every direction.
    pub fn splat(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            values: [value.clone(), value.clone(), value.clone(), value],
        }
    }

    /// Iterates over the entries in canonical direction order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &T)> {
        Direction::ALL.iter().map(move |d| (*d, &self.values[d.index()]))
    }
}

impl<T> Index<Direction> for PerDirection<T> {
    type Output = T;

    fn index(&self, direction: Direction) -> &T {
        &self.values[direction.index()]
    }
}

impl<T> IndexMut<Direction> for PerDirection<T> {
    fn index_mut(&mut self, direction: Direction) -> &mut T {
        &mut self.values[direction.index()]
    }
}
