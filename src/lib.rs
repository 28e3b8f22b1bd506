pub use cgmath;
pub use collector::{DataCollector, QueueLengthRecord, SignalPhaseRecord};
pub use config::{
    IntersectionConfig, IntersectionKind, SignalControlConfig, SimulationConfig,
    TurnProbabilities, VehicleDefaults, VehicleGenerationConfig,
};
pub use conflict::{CollisionEvent, ConflictMonitor, ConflictSeverity};
pub use controller::{ControlPhase, SignalController};
pub use direction::{Axis, Direction, PerDirection, TurnIntent};
pub use generator::VehicleGenerator;
pub use intersection::{Bounds, Intersection};
pub use light::{SignalPhase, TrafficLight};
pub use movement::MovementSystem;
pub use random::SeededRandom;
pub use road::Road;
pub use simulation::{RunState, Simulation, SimulationResults, SimulationSummary};
pub use stats::{DirectionStatistics, Statistics};
pub use vehicle::{Leader, Vehicle, VehicleId, VehicleRecord, VehicleStatus};

mod collector;
mod config;
mod conflict;
mod controller;
mod direction;
mod generator;
mod intersection;
mod light;
pub mod math;
mod movement;
mod random;
mod road;
mod simulation;
pub mod stats;
mod vehicle;
