//! Aggregate statistics over a finished (or in-progress) run.

use crate::collector::QueueLengthRecord;
use crate::direction::{Direction, PerDirection};
use crate::vehicle::VehicleRecord;

/// Aggregate measures for one approach.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectionStatistics {
    pub vehicle_count: usize,
    pub average_travel_time: f64,
    pub average_wait_time: f64,
    /// Vehicles per hour.
    pub throughput: f64,
    pub average_queue_length: f64,
}

/// Aggregate measures for a whole run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statistics {
    pub total_vehicles: usize,
    pub average_travel_time: f64,
    pub average_wait_time: f64,
    /// Vehicles per hour.
    pub throughput: f64,
    /// Delay is approximated by the time spent waiting.
    pub average_delay: f64,
    pub average_queue_length: f64,
    pub by_direction: PerDirection<DirectionStatistics>,
}

impl Statistics {
    /// Computes run statistics from the collected records.
    ///
    /// `duration` is the full run length; the warmup period is subtracted
    /// before any rate is formed, and a non-positive effective duration
    /// yields zero throughput rather than a division by zero.
    pub fn calculate(
        records: &[VehicleRecord],
        queue_history: &[QueueLengthRecord],
        duration: f64,
        warmup_period: f64,
    ) -> Self {
        let effective_duration = duration - warmup_period;

        let by_direction = PerDirection::from_fn(|dir| {
            let for_direction: Vec<&VehicleRecord> =
                records.iter().filter(|r| r.direction == dir).collect();
            DirectionStatistics {
                vehicle_count: for_direction.len(),
                average_travel_time: mean(for_direction.iter().map(|r| r.total_travel_time)),
                average_wait_time: mean(for_direction.iter().map(|r| r.wait_time)),
                throughput: throughput(for_direction.len(), effective_duration),
                average_queue_length: mean(
                    queue_history.iter().map(|q| q.queue_lengths[dir] as f64),
                ),
            }
        });

        let average_wait_time = mean(records.iter().map(|r| r.wait_time));
        Self {
            total_vehicles: records.len(),
            average_travel_time: mean(records.iter().map(|r| r.total_travel_time)),
            average_wait_time,
            throughput: throughput(records.len(), effective_duration),
            average_delay: average_wait_time,
            average_queue_length: mean(
                queue_history
                    .iter()
                    .flat_map(|q| Direction::ALL.map(|dir| q.queue_lengths[dir] as f64)),
            ),
            by_direction,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn throughput(count: usize, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    count as f64 / (duration / 3600.0)
}

/// Linearly interpolated percentile of an unsorted sample. `percentile`
/// runs from 0 to 100; an empty sample yields 0.
pub fn percentile(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let index = (percentile / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    let weight = index - lower as f64;

    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Population standard deviation of a sample; 0 when empty.
pub fn std_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Trailing moving average with a window of `window_size` samples. The
/// window is truncated at the start of the series.
pub fn moving_average(values: &[f64], window_size: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window_size);
            let window = &values[start..=i];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::direction::TurnIntent;
    use crate::vehicle::VehicleId;
    use assert_approx_eq::assert_approx_eq;

    fn record(id: u64, direction: Direction, travel: f64, wait: f64) -> VehicleRecord {
        VehicleRecord {
            id: VehicleId(id),
            entry_time: 100.0,
            exit_time: 100.0 + travel,
            total_travel_time: travel,
            wait_time: wait,
            direction,
            turn_intent: TurnIntent::Straight,
            peak_velocity: 11.0,
        }
    }

    #[test]
    fn empty_input_is_all_zeros() {
        let stats = Statistics::calculate(&[], &[], 1800.0, 120.0);
        assert_eq!(stats.total_vehicles, 0);
        assert_approx_eq!(stats.average_travel_time, 0.0);
        assert_approx_eq!(stats.throughput, 0.0);
        assert_approx_eq!(stats.average_queue_length, 0.0);
    }

    #[test]
    fn zero_effective_duration_gives_zero_throughput() {
        let records = [record(1, Direction::North, 30.0, 5.0)];
        let stats = Statistics::calculate(&records, &[], 120.0, 120.0);
        assert_approx_eq!(stats.throughput, 0.0);
        assert_eq!(stats.total_vehicles, 1);
    }

    #[test]
    fn overall_means_and_throughput() {
        let records = [
            record(1, Direction::North, 30.0, 10.0),
            record(2, Direction::North, 40.0, 20.0),
            record(3, Direction::East, 50.0, 30.0),
        ];
        // One effective hour.
        let stats = Statistics::calculate(&records, &[], 3720.0, 120.0);
        assert_approx_eq!(stats.average_travel_time, 40.0);
        assert_approx_eq!(stats.average_wait_time, 20.0);
        assert_approx_eq!(stats.average_delay, 20.0);
        assert_approx_eq!(stats.throughput, 3.0);
    }

    #[test]
    fn per_direction_breakdown() {
        let records = [
            record(1, Direction::North, 30.0, 10.0),
            record(2, Direction::North, 50.0, 20.0),
            record(3, Direction::East, 20.0, 5.0),
        ];
        let stats = Statistics::calculate(&records, &[], 1920.0, 120.0);

        let north = stats.by_direction[Direction::North];
        assert_eq!(north.vehicle_count, 2);
        assert_approx_eq!(north.average_travel_time, 40.0);
        assert_approx_eq!(north.throughput, 4.0);

        let south = stats.by_direction[Direction::South];
        assert_eq!(south.vehicle_count, 0);
        assert_approx_eq!(south.average_travel_time, 0.0);
    }

    #[test]
    fn queue_length_means() {
        let queue_history = [
            QueueLengthRecord {
                time: 5.0,
                queue_lengths: PerDirection::new(4, 2, 0, 2),
            },
            QueueLengthRecord {
                time: 10.0,
                queue_lengths: PerDirection::new(6, 2, 0, 0),
            },
        ];
        let stats = Statistics::calculate(&[], &queue_history, 1800.0, 0.0);
        assert_approx_eq!(stats.average_queue_length, 2.0);
        assert_approx_eq!(stats.by_direction[Direction::North].average_queue_length, 5.0);
        assert_approx_eq!(stats.by_direction[Direction::East].average_queue_length, 0.0);
    }

    #[test]
    fn percentile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_approx_eq!(percentile(&values, 0.0), 1.0);
        assert_approx_eq!(percentile(&values, 100.0), 4.0);
        assert_approx_eq!(percentile(&values, 50.0), 2.5);
        assert_approx_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn std_deviation_of_a_known_sample() {
        assert_approx_eq!(std_deviation(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
        assert_approx_eq!(std_deviation(&[]), 0.0);
    }

    #[test]
    fn moving_average_truncates_the_leading_window() {
        let averaged = moving_average(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(averaged.len(), 4);
        assert_approx_eq!(averaged[0], 1.0);
        assert_approx_eq!(averaged[1], 1.5);
        assert_approx_eq!(averaged[3], 3.5);
    }
}
