//! Stochastic vehicle arrivals.

use crate::config::{VehicleDefaults, VehicleGenerationConfig};
use crate::direction::{Direction, TurnIntent};
use crate::math::Point2d;
use crate::random::SeededRandom;
use crate::vehicle::{Vehicle, VehicleId};
use log::warn;

/// Generates vehicle arrivals as independent per-step Bernoulli trials.
///
/// The arrival probability for one step is `(rate / 60) * dt`, which
/// approximates a Poisson arrival process for small time steps. The id
/// counter is owned here and reset explicitly with the rest of the engine.
pub struct VehicleGenerator {
    spawn_rates: crate::direction::PerDirection<f64>,
    turn_probabilities: crate::config::TurnProbabilities,
    defaults: VehicleDefaults,
    next_id: u64,
}

impl VehicleGenerator {
    /// Creates a generator from the arrival configuration.
    pub fn new(config: &VehicleGenerationConfig, defaults: &VehicleDefaults) -> Self {
        Self {
            spawn_rates: config.spawn_rates,
            turn_probabilities: config.turn_probabilities,
            defaults: *defaults,
            next_id: 1,
        }
    }

    /// Draws one arrival trial for a direction. Exactly one uniform draw
    /// is consumed per call, plus one more when a vehicle is created, so
    /// the draw order is fixed by the caller's direction iteration order.
    pub fn try_generate(
        &mut self,
        rng: &mut SeededRandom,
        direction: Direction,
        dt: f64,
        entry_position: Point2d,
    ) -> Option<Vehicle> {
        let rate_per_second = self.spawn_rates[direction] / 60.0;
        let probability = rate_per_second * dt;

        rng.chance(probability)
            .then(|| self.create_vehicle(rng, direction, entry_position))
    }

    fn create_vehicle(
        &mut self,
        rng: &mut SeededRandom,
        direction: Direction,
        entry_position: Point2d,
    ) -> Vehicle {
        let turn_intent = self.choose_turn_intent(rng);
        let id = VehicleId(self.next_id);
        self.next_id += 1;

        Vehicle::new(id, direction, turn_intent, 0, entry_position, &self.defaults)
    }

    /// Partitions one uniform draw by the cumulative turn probabilities.
    /// The probabilities are trusted to sum to 1; config validation is the
    /// caller's responsibility.
    fn choose_turn_intent(&self, rng: &mut SeededRandom) -> TurnIntent {
        let r = rng.uniform();
        let p = self.turn_probabilities;

        if r < p.straight {
            TurnIntent::Straight
        } else if r < p.straight + p.left {
            TurnIntent::Left
        } else {
            TurnIntent::Right
        }
    }

    /// The arrival rate for a direction, in vehicles per minute.
    pub fn spawn_rate(&self, direction: Direction) -> f64 {
        self.spawn_rates[direction]
    }

    /// Changes the arrival rate for a direction. An out-of-range rate is
    /// applied anyway, with a warning; validation belongs to the config.
    pub fn set_spawn_rate(&mut self, direction: Direction, rate: f64) {
        if !(0.0..=60.0).contains(&rate) {
            warn!("spawn rate {} is out of valid range (0-60)", rate);
        }
        self.spawn_rates[direction] = rate;
    }

    /// How many vehicles have been generated so far.
    pub fn generated_count(&self) -> u64 {
        self.next_id - 1
    }

    /// Restarts the id sequence.
    pub fn reset(&mut self) {
        self.next_id = 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::direction::PerDirection;
    use assert_approx_eq::assert_approx_eq;

    fn generator(rates: PerDirection<f64>) -> VehicleGenerator {
        let config = SimulationConfig::default();
        let generation = VehicleGenerationConfig {
            spawn_rates: rates,
            turn_probabilities: config.vehicle_generation.turn_probabilities,
        };
        VehicleGenerator::new(&generation, &config.vehicle_defaults)
    }

    #[test]
    fn ids_are_monotonic() {
        let mut rng = SeededRandom::new(42);
        let mut generator = generator(PerDirection::splat(60.0));
        let entry = Point2d::new(0.0, -200.0);

        let mut last = 0;
        for _ in 0..50 {
            if let Some(v) = generator.try_generate(&mut rng, Direction::North, 1.0, entry) {
                assert!(v.id().0 > last);
                last = v.id().0;
            }
        }
        assert_eq!(generator.generated_count(), last);
    }

    #[test]
    fn zero_rate_never_generates() {
        let mut rng = SeededRandom::new(42);
        let mut generator = generator(PerDirection::splat(0.0));
        for _ in 0..1000 {
            let v = generator.try_generate(
                &mut rng,
                Direction::East,
                1.0,
                Point2d::new(-200.0, 0.0),
            );
            assert!(v.is_none());
        }
    }

    #[test]
    fn arrival_count_matches_the_rate_in_expectation() {
        // 15 veh/min for an hour of 0.25s steps: expect about 900.
        let mut rng = SeededRandom::new(42);
        let mut generator = generator(PerDirection::splat(15.0));
        let entry = Point2d::new(0.0, -200.0);

        let steps = (3600.0 / 0.25) as usize;
        for _ in 0..steps {
            generator.try_generate(&mut rng, Direction::North, 0.25, entry);
        }
        let generated = generator.generated_count() as f64;
        assert_approx_eq!(generated / 900.0, 1.0, 0.1);
    }

    #[test]
    fn turn_intents_follow_the_configured_split() {
        let mut rng = SeededRandom::new(7);
        let mut generator = generator(PerDirection::splat(60.0));
        let entry = Point2d::new(0.0, -200.0);

        let mut straight = 0usize;
        let mut total = 0usize;
        for _ in 0..5000 {
            if let Some(v) = generator.try_generate(&mut rng, Direction::North, 1.0, entry) {
                total += 1;
                if v.turn_intent() == TurnIntent::Straight {
                    straight += 1;
                }
            }
        }
        // 60 veh/min at dt=1 generates every step.
        assert_eq!(total, 5000);
        assert_approx_eq!(straight as f64 / total as f64, 0.6, 0.05);
    }

    #[test]
    fn new_vehicles_start_at_rest_in_lane_zero() {
        let mut rng = SeededRandom::new(1);
        let mut generator = generator(PerDirection::splat(60.0));
        let entry = Point2d::new(0.0, -200.0);
        let vehicle = generator
            .try_generate(&mut rng, Direction::North, 1.0, entry)
            .expect("rate 60/min at dt=1 always generates");
        assert_eq!(vehicle.lane(), 0);
        assert_approx_eq!(vehicle.velocity(), 0.0);
        assert_approx_eq!(vehicle.position().y, -200.0);
    }

    #[test]
    fn spawn_rate_can_be_changed_at_runtime() {
        let mut rng = SeededRandom::new(42);
        let mut generator = generator(PerDirection::splat(0.0));
        generator.set_spawn_rate(Direction::North, 60.0);
        assert_approx_eq!(generator.spawn_rate(Direction::North), 60.0);
        let vehicle =
            generator.try_generate(&mut rng, Direction::North, 1.0, Point2d::new(0.0, -200.0));
        assert!(vehicle.is_some());
    }

    #[test]
    fn reset_restarts_the_id_sequence() {
        let mut rng = SeededRandom::new(42);
        let mut generator = generator(PerDirection::splat(60.0));
        let entry = Point2d::new(0.0, -200.0);
        generator.try_generate(&mut rng, Direction::North, 1.0, entry);
        assert_eq!(generator.generated_count(), 1);
        generator.reset();
        assert_eq!(generator.generated_count(), 0);
        let vehicle = generator
            .try_generate(&mut rng, Direction::North, 1.0, entry)
            .expect("rate 60/min at dt=1 always generates");
        assert_eq!(vehicle.id(), VehicleId(1));
    }
}
