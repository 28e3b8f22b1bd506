//! Time-series data collection during a run.

use crate::direction::{Direction, PerDirection};
use crate::light::SignalPhase;
use crate::vehicle::VehicleRecord;
use log::info;

/// Seconds between queue length samples.
const SAMPLING_INTERVAL: f64 = 5.0; // s

/// A queue length sample across all approaches.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueLengthRecord {
    pub time: f64,
    pub queue_lengths: PerDirection<u32>,
}

/// The signal assignment across all approaches at a phase change.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalPhaseRecord {
    pub time: f64,
    pub phases: PerDirection<SignalPhase>,
}

/// Collects per-vehicle records and time series while the engine runs.
///
/// Vehicles that exit during the warmup period are discarded so the
/// statistics describe the steady state, not the fill-up transient.
pub struct DataCollector {
    records: Vec<VehicleRecord>,
    queue_history: Vec<QueueLengthRecord>,
    phase_history: Vec<SignalPhaseRecord>,
    warmup_period: f64,
    warmup_complete: bool,
    since_last_sample: f64,
}

impl DataCollector {
    pub fn new(warmup_period: f64) -> Self {
        Self {
            records: Vec::new(),
            queue_history: Vec::new(),
            phase_history: Vec::new(),
            warmup_period,
            warmup_complete: false,
            since_last_sample: 0.0,
        }
    }

    /// Notes a vehicle entering the simulation. Only used to detect the
    /// end of the warmup period.
    pub fn record_entry(&mut self, time: f64) {
        if time >= self.warmup_period && !self.warmup_complete {
            self.warmup_complete = true;
            info!("warmup period complete at t={:.2}s", time);
        }
    }

    /// Keeps an exited vehicle's record, unless it left during warmup.
    pub fn record_exit(&mut self, record: VehicleRecord) {
        if record.exit_time >= self.warmup_period {
            self.records.push(record);
        }
    }

    /// Accumulates toward the sampling interval and stores a queue length
    /// sample each time it elapses.
    pub fn record_queue_lengths(
        &mut self,
        time: f64,
        queue_lengths: PerDirection<u32>,
        dt: f64,
    ) {
        self.since_last_sample += dt;
        if self.since_last_sample >= SAMPLING_INTERVAL {
            self.queue_history.push(QueueLengthRecord {
                time,
                queue_lengths,
            });
            self.since_last_sample = 0.0;
        }
    }

    /// Stores the signal assignment, but only when it differs from the
    /// last stored one.
    pub fn record_signal_phases(&mut self, time: f64, phases: PerDirection<SignalPhase>) {
        let changed = self
            .phase_history
            .last()
            .map_or(true, |last| last.phases != phases);
        if changed {
            self.phase_history.push(SignalPhaseRecord { time, phases });
        }
    }

    /// Every kept vehicle record, in exit order.
    pub fn records(&self) -> &[VehicleRecord] {
        &self.records
    }

    /// The queue length time series.
    pub fn queue_history(&self) -> &[QueueLengthRecord] {
        &self.queue_history
    }

    /// The signal phase change series.
    pub fn phase_history(&self) -> &[SignalPhaseRecord] {
        &self.phase_history
    }

    /// The kept records for one approach.
    pub fn records_for(&self, direction: Direction) -> Vec<&VehicleRecord> {
        self.records
            .iter()
            .filter(|r| r.direction == direction)
            .collect()
    }

    /// The kept records whose exit time falls within `[start, end]`.
    pub fn records_in(&self, start: f64, end: f64) -> Vec<&VehicleRecord> {
        self.records
            .iter()
            .filter(|r| r.exit_time >= start && r.exit_time <= end)
            .collect()
    }

    /// How many vehicle records have been kept.
    pub fn collected_count(&self) -> usize {
        self.records.len()
    }

    /// Whether the warmup period has elapsed.
    pub fn warmup_complete(&self) -> bool {
        self.warmup_complete
    }

    /// Clears everything collected.
    pub fn reset(&mut self) {
        self.records.clear();
        self.queue_history.clear();
        self.phase_history.clear();
        self.warmup_complete = false;
        self.since_last_sample = 0.0;
    }
}
