//! The simulation engine: wires the subsystems together and owns the clock.

use crate::collector::{DataCollector, QueueLengthRecord, SignalPhaseRecord};
use crate::config::SimulationConfig;
use crate::conflict::{CollisionEvent, ConflictMonitor};
use crate::controller::SignalController;
use crate::direction::{Direction, PerDirection};
use crate::generator::VehicleGenerator;
use crate::intersection::Intersection;
use crate::light::{SignalPhase, TrafficLight};
use crate::movement::MovementSystem;
use crate::random::SeededRandom;
use crate::stats::Statistics;
use crate::vehicle::{Vehicle, VehicleRecord};
use log::{info, warn};

/// Where the engine is in its run lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RunState {
    Ready,
    Running,
    Paused,
    Completed,
}

/// Everything a finished run leaves behind.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationResults {
    pub config: SimulationConfig,
    pub statistics: Statistics,
    pub vehicle_records: Vec<VehicleRecord>,
    pub queue_length_history: Vec<QueueLengthRecord>,
    pub signal_phase_history: Vec<SignalPhaseRecord>,
    pub collision_events: Vec<CollisionEvent>,
    /// Wall-clock completion time, RFC 3339.
    pub completed_at: String,
}

/// A point-in-time snapshot of the engine's counters.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationSummary {
    pub time: f64,
    pub state: RunState,
    pub vehicle_count: usize,
    pub collected_vehicles: usize,
    pub signal_cycles: u64,
    pub collisions: usize,
    pub near_misses: usize,
}

/// A deterministic signal-controlled intersection simulation.
///
/// All randomness flows through one seeded source, and every per-step
/// traversal runs in canonical direction order, so two engines built from
/// the same configuration produce identical runs.
pub struct Simulation {
    config: SimulationConfig,
    rng: SeededRandom,
    intersection: Intersection,
    controller: SignalController,
    generator: VehicleGenerator,
    movement: MovementSystem,
    conflicts: ConflictMonitor,
    collector: DataCollector,
    state: RunState,
    /// Simulated time in s.
    current_time: f64,
}

impl Simulation {
    /// Builds an engine from its configuration. The configuration is
    /// taken as given; call [SimulationConfig::validate] first to reject
    /// a bad one.
    pub fn new(config: SimulationConfig) -> Self {
        let rng = SeededRandom::new(config.random_seed);
        let intersection = Intersection::new(&config.intersection);

        let lights = PerDirection::from_fn(|dir| {
            intersection.is_active(dir).then(|| {
                let green = match dir.axis() {
                    crate::direction::Axis::NorthSouth => config.signal_control.green_north_south,
                    crate::direction::Axis::EastWest => config.signal_control.green_east_west,
                };
                TrafficLight::new(
                    dir,
                    intersection.traffic_light_position(dir),
                    green,
                    config.signal_control.yellow,
                    config.signal_control.all_red,
                    SignalPhase::Red,
                )
            })
        });
        let controller = SignalController::new(lights, config.signal_control.clone());

        let generator = VehicleGenerator::new(&config.vehicle_generation, &config.vehicle_defaults);
        let collector = DataCollector::new(config.warmup_period);

        Self {
            rng,
            intersection,
            controller,
            generator,
            movement: MovementSystem::new(),
            conflicts: ConflictMonitor::new(),
            collector,
            state: RunState::Ready,
            current_time: 0.0,
            config,
        }
    }

    /// Advances the simulation by one time step.
    ///
    /// The sub-steps always run in the same order: generation, signal
    /// control, kinematics, conflict detection, eviction, data collection,
    /// and finally the clock.
    pub fn step(&mut self) {
        let dt = self.config.time_step;

        self.generate_vehicles(dt);
        self.controller.update(dt);
        self.movement.update_all(dt, &self.intersection, &self.controller);

        self.conflicts
            .scan(&self.movement.ordered_vehicles(), self.current_time);

        for vehicle in self.movement.remove_exited(&self.intersection) {
            self.collector.record_exit(vehicle.into_record(self.current_time));
        }

        self.collect_data(dt);
        self.current_time += dt;

        if self.current_time >= self.config.duration {
            self.state = RunState::Completed;
            info!("simulation completed at t={:.2}s", self.current_time);
        }
    }

    /// Steps until the configured duration has elapsed.
    pub fn run_to_completion(&mut self) {
        self.start();
        while self.state == RunState::Running {
            self.step();
        }
    }

    fn generate_vehicles(&mut self, dt: f64) {
        // Active directions in canonical order keeps the draw sequence,
        // and with it the whole run, reproducible.
        for dir in Direction::ALL {
            let road = match self.intersection.road(dir) {
                Some(road) => road,
                None => continue,
            };

            let entry = road.entry_position(0);
            if let Some(vehicle) = self.generator.try_generate(&mut self.rng, dir, dt, entry) {
                self.movement.add_vehicle(vehicle);
                self.collector.record_entry(self.current_time);
            }
        }
    }

    fn collect_data(&mut self, dt: f64) {
        let queue_lengths = PerDirection::from_fn(|dir| self.movement.queue_length(dir));
        self.collector
            .record_queue_lengths(self.current_time, queue_lengths, dt);

        let phases = PerDirection::from_fn(|dir| self.controller.phase(dir));
        self.collector.record_signal_phases(self.current_time, phases);
    }

    /// Starts a ready engine, or resumes a paused one.
    pub fn start(&mut self) {
        if self.state != RunState::Ready && self.state != RunState::Paused {
            warn!("cannot start a simulation in state {:?}", self.state);
            return;
        }
        self.state = RunState::Running;
        info!("simulation started (duration: {}s)", self.config.duration);
    }

    /// Pauses a running engine.
    pub fn pause(&mut self) {
        if self.state != RunState::Running {
            warn!("cannot pause a simulation in state {:?}", self.state);
            return;
        }
        self.state = RunState::Paused;
    }

    /// Resumes a paused engine.
    pub fn resume(&mut self) {
        if self.state != RunState::Paused {
            warn!("cannot resume a simulation in state {:?}", self.state);
            return;
        }
        self.state = RunState::Running;
    }

    /// Ends the run early. Results remain available.
    pub fn stop(&mut self) {
        self.state = RunState::Completed;
    }

    /// Returns the engine to its initial state, including a fresh random
    /// sequence from the configured seed.
    pub fn reset(&mut self) {
        self.current_time = 0.0;
        self.state = RunState::Ready;
        self.rng = SeededRandom::new(self.config.random_seed);
        self.controller.reset();
        self.movement.reset();
        self.conflicts.reset();
        self.collector.reset();
        self.generator.reset();
    }

    /// Bundles up the run's output.
    pub fn results(&self) -> SimulationResults {
        let statistics = Statistics::calculate(
            self.collector.records(),
            self.collector.queue_history(),
            self.config.duration,
            self.config.warmup_period,
        );

        SimulationResults {
            config: self.config.clone(),
            statistics,
            vehicle_records: self.collector.records().to_vec(),
            queue_length_history: self.collector.queue_history().to_vec(),
            signal_phase_history: self.collector.phase_history().to_vec(),
            collision_events: self.conflicts.events().to_vec(),
            completed_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Statistics over what has been collected so far, rated against the
    /// elapsed time rather than the configured duration.
    pub fn current_statistics(&self) -> Statistics {
        Statistics::calculate(
            self.collector.records(),
            self.collector.queue_history(),
            self.current_time,
            self.config.warmup_period,
        )
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Simulated time in s.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Run progress from 0 to 1.
    pub fn progress(&self) -> f64 {
        (self.current_time / self.config.duration).min(1.0)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn intersection(&self) -> &Intersection {
        &self.intersection
    }

    /// The number of live vehicles.
    pub fn vehicle_count(&self) -> usize {
        self.movement.total_count()
    }

    /// Every live vehicle, in a deterministic order.
    pub fn vehicles(&self) -> Vec<&Vehicle> {
        self.movement.ordered_vehicles()
    }

    /// Every installed traffic light, in canonical direction order.
    pub fn traffic_lights(&self) -> impl Iterator<Item = &TrafficLight> {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| self.controller.light(dir))
    }

    /// A snapshot of the engine's counters.
    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            time: self.current_time,
            state: self.state,
            vehicle_count: self.movement.total_count(),
            collected_vehicles: self.collector.collected_count(),
            signal_cycles: self.controller.cycle_count(),
            collisions: self.conflicts.collision_count(),
            near_misses: self.conflicts.near_miss_count(),
        }
    }
}
