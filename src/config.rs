//! Simulation configuration.
//!
//! A [SimulationConfig] is an immutable input: it is validated once before
//! a run starts and never mutated afterwards. Changing a parameter means
//! constructing a new config and resetting the engine.

use crate::direction::{Direction, PerDirection};

/// The shape of the intersection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum IntersectionKind {
    FourWay,
    ThreeWay,
}

/// Geometry of the intersection and its approach roads.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntersectionConfig {
    pub kind: IntersectionKind,
    /// Width of the central conflict area in m.
    pub width: f64,
    /// Length of each approach road in m.
    pub approach_length: f64,
    /// Width of a single lane in m.
    pub lane_width: f64,
    /// Lane count per approach; zero disables the approach.
    pub num_lanes: PerDirection<u32>,
}

/// Fixed-cycle signal timing.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalControlConfig {
    /// Full cycle length in s; must equal the sum of the six phases.
    pub cycle_length: f64,
    /// North-south green time in s.
    pub green_north_south: f64,
    /// East-west green time in s.
    pub green_east_west: f64,
    /// Yellow time in s.
    pub yellow: f64,
    /// All-red clearance time in s.
    pub all_red: f64,
}

impl SignalControlConfig {
    /// The cycle length implied by the six phase durations.
    pub fn computed_cycle_length(&self) -> f64 {
        self.green_north_south + self.green_east_west + 2.0 * (self.yellow + self.all_red)
    }
}

/// Probabilities of each turn intent; must sum to 1.
///
/// No renormalization is performed, so a misconfigured sum biases
/// outcomes. [SimulationConfig::validate] catches it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnProbabilities {
    pub straight: f64,
    pub left: f64,
    pub right: f64,
}

/// Stochastic arrival configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleGenerationConfig {
    /// Arrival rates in vehicles per minute, per approach.
    pub spawn_rates: PerDirection<f64>,
    pub turn_probabilities: TurnProbabilities,
}

/// Physical defaults applied to every generated vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleDefaults {
    /// Desired speed in m/s.
    pub max_speed: f64,
    /// Maximum acceleration in m/s^2.
    pub max_acceleration: f64,
    /// Comfortable deceleration, a positive number in m/s^2.
    pub comfortable_deceleration: f64,
    /// Minimum standstill gap to the vehicle ahead in m.
    pub min_gap: f64,
    /// Driver reaction time in s.
    pub reaction_time: f64,
    /// Vehicle length in m.
    pub length: f64,
}

/// The complete, immutable input to a simulation run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Simulated duration in s.
    pub duration: f64,
    /// Logical time step in s.
    pub time_step: f64,
    /// Initial interval excluded from statistics, in s.
    pub warmup_period: f64,
    pub random_seed: u64,
    pub intersection: IntersectionConfig,
    pub signal_control: SignalControlConfig,
    pub vehicle_generation: VehicleGenerationConfig,
    pub vehicle_defaults: VehicleDefaults,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration: 1800.0,
            time_step: 1.0,
            warmup_period: 120.0,
            random_seed: 42,
            intersection: IntersectionConfig {
                kind: IntersectionKind::FourWay,
                width: 20.0,
                approach_length: 200.0,
                lane_width: 3.5,
                num_lanes: PerDirection::splat(2),
            },
            signal_control: SignalControlConfig {
                cycle_length: 70.0,
                green_north_south: 30.0,
                green_east_west: 30.0,
                yellow: 3.0,
                all_red: 2.0,
            },
            vehicle_generation: VehicleGenerationConfig {
                spawn_rates: PerDirection::splat(15.0),
                turn_probabilities: TurnProbabilities {
                    straight: 0.6,
                    left: 0.2,
                    right: 0.2,
                },
            },
            vehicle_defaults: VehicleDefaults {
                max_speed: 11.1, // 40 km/h
                max_acceleration: 2.0,
                comfortable_deceleration: 3.0,
                min_gap: 2.0,
                reaction_time: 1.5,
                length: 4.5,
            },
        }
    }
}

impl SimulationConfig {
    /// Validates the configuration, returning every problem found.
    ///
    /// An empty result means the config may be used to start a run.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        if self.duration <= 0.0 {
            errors.push("duration must be positive".to_string());
        }
        if self.time_step <= 0.0 || self.time_step > 1.0 {
            errors.push("time step must be between 0 and 1".to_string());
        }
        if self.warmup_period < 0.0 {
            errors.push("warmup period must be non-negative".to_string());
        }
        if self.warmup_period >= self.duration {
            errors.push("warmup period must be less than duration".to_string());
        }

        if self.intersection.width <= 0.0 {
            errors.push("intersection width must be positive".to_string());
        }
        if self.intersection.approach_length <= 0.0 {
            errors.push("approach length must be positive".to_string());
        }
        if self.intersection.lane_width <= 0.0 {
            errors.push("lane width must be positive".to_string());
        }
        for dir in Direction::ALL {
            let lanes = self.intersection.num_lanes[dir];
            if lanes > 3 {
                errors.push(format!("number of lanes for {} must be between 0 and 3", dir));
            }
        }
        if self.intersection.kind == IntersectionKind::ThreeWay {
            let zero_lane_count = Direction::ALL
                .iter()
                .filter(|d| self.intersection.num_lanes[**d] == 0)
                .count();
            if zero_lane_count != 1 {
                errors.push(
                    "three-way intersection must have exactly one direction with 0 lanes"
                        .to_string(),
                );
            }
        }

        let signal = &self.signal_control;
        if signal.green_north_south <= 0.0 {
            errors.push("north-south green duration must be positive".to_string());
        }
        if signal.green_east_west <= 0.0 {
            errors.push("east-west green duration must be positive".to_string());
        }
        if signal.yellow <= 0.0 {
            errors.push("yellow duration must be positive".to_string());
        }
        if signal.all_red < 0.0 {
            errors.push("all-red duration must be non-negative".to_string());
        }
        if (signal.cycle_length - signal.computed_cycle_length()).abs() > 0.1 {
            errors.push(format!(
                "cycle length ({}) does not match calculated value ({})",
                signal.cycle_length,
                signal.computed_cycle_length()
            ));
        }

        for dir in Direction::ALL {
            let rate = self.vehicle_generation.spawn_rates[dir];
            if !(0.0..=60.0).contains(&rate) {
                errors.push(format!(
                    "spawn rate for {} must be between 0 and 60 vehicles/min",
                    dir
                ));
            }
        }
        let p = self.vehicle_generation.turn_probabilities;
        let sum = p.straight + p.left + p.right;
        if (sum - 1.0).abs() > 0.001 {
            errors.push(format!(
                "turn probabilities must sum to 1.0 (current sum: {})",
                sum
            ));
        }

        let defaults = &self.vehicle_defaults;
        if defaults.max_speed <= 0.0 {
            errors.push("max speed must be positive".to_string());
        }
        if defaults.max_acceleration <= 0.0 {
            errors.push("max acceleration must be positive".to_string());
        }
        if defaults.comfortable_deceleration <= 0.0 {
            errors.push("comfortable deceleration must be positive".to_string());
        }
        if defaults.min_gap < 0.0 {
            errors.push("min gap must be non-negative".to_string());
        }
        if defaults.reaction_time <= 0.0 {
            errors.push("reaction time must be positive".to_string());
        }
        if defaults.length <= 0.0 {
            errors.push("vehicle length must be positive".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_empty());
    }

    #[test]
    fn default_cycle_length_is_consistent() {
        let config = SimulationConfig::default();
        assert_approx_eq!(config.signal_control.computed_cycle_length(), 70.0);
    }

    #[test]
    fn rejects_bad_durations() {
        let mut config = SimulationConfig::default();
        config.duration = 0.0;
        config.time_step = 2.0;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("duration must be positive")));
        assert!(errors.iter().any(|e| e.contains("time step")));
    }

    #[test]
    fn rejects_inconsistent_cycle_length() {
        let mut config = SimulationConfig::default();
        config.signal_control.cycle_length = 60.0;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("cycle length")));
    }

    #[test]
    fn rejects_bad_turn_probabilities() {
        let mut config = SimulationConfig::default();
        config.vehicle_generation.turn_probabilities.left = 0.5;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("turn probabilities")));
    }

    #[test]
    fn rejects_three_way_without_missing_leg() {
        let mut config = SimulationConfig::default();
        config.intersection.kind = IntersectionKind::ThreeWay;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("three-way")));

        config.intersection.num_lanes[Direction::West] = 0;
        assert!(config.validate().is_empty());
    }

    #[test]
    fn rejects_out_of_range_lanes_and_rates() {
        let mut config = SimulationConfig::default();
        config.intersection.num_lanes[Direction::North] = 4;
        config.vehicle_generation.spawn_rates[Direction::South] = 75.0;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("lanes for north")));
        assert!(errors.iter().any(|e| e.contains("spawn rate for south")));
    }
}
