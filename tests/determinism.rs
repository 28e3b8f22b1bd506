//! Tests that two runs from the same configuration are identical.

use intersection_sim::{PerDirection, Simulation, SimulationConfig};

fn config(seed: u64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.duration = 400.0;
    config.warmup_period = 60.0;
    config.time_step = 0.5;
    config.random_seed = seed;
    config
}

fn run(config: SimulationConfig) -> Simulation {
    let mut sim = Simulation::new(config);
    sim.run_to_completion();
    sim
}

/// Two engines built from the same configuration must produce the same
/// run, record for record and event for event.
#[test]
fn identical_configs_produce_identical_runs() {
    let a = run(config(42)).results();
    let b = run(config(42)).results();

    assert_eq!(a.vehicle_records, b.vehicle_records);
    assert_eq!(a.queue_length_history, b.queue_length_history);
    assert_eq!(a.signal_phase_history, b.signal_phase_history);
    assert_eq!(a.collision_events, b.collision_events);
    assert_eq!(a.statistics, b.statistics);
}

/// Different seeds should not replay the same arrival pattern.
#[test]
fn different_seeds_diverge() {
    let a = run(config(42)).results();
    let b = run(config(43)).results();

    // With four approaches at 15 veh/min over 400 s, identical record
    // sets across seeds would be astonishing.
    assert_ne!(a.vehicle_records, b.vehicle_records);
}

/// The seeded source, not ambient state, must be the only randomness:
/// a run with all arrivals disabled is fully static except the signals.
#[test]
fn no_arrivals_means_no_vehicles() {
    let mut quiet = config(42);
    quiet.vehicle_generation.spawn_rates = PerDirection::splat(0.0);
    let sim = run(quiet);

    assert_eq!(sim.vehicle_count(), 0);
    let results = sim.results();
    assert!(results.vehicle_records.is_empty());
    assert!(results.collision_events.is_empty());
    assert_eq!(results.statistics.total_vehicles, 0);
}
