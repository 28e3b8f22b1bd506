//! A single signal head.
//!
//! Under cooperative control the [SignalController](crate::SignalController)
//! is authoritative: it pushes phases into each light and the light never
//! self-advances. The standalone transition exists for an uncoordinated
//! light and is unused in that mode.

use crate::direction::Direction;
use crate::math::Point2d;

/// A signal color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SignalPhase {
    Green,
    Yellow,
    Red,
}

/// A traffic light governing one approach.
pub struct TrafficLight {
    direction: Direction,
    position: Point2d,
    phase: SignalPhase,
    /// Time since the current phase was entered, in s.
    time_in_phase: f64,
    green_duration: f64,
    yellow_duration: f64,
    all_red_duration: f64,
}

impl TrafficLight {
    /// Creates a light in the given initial phase.
    pub fn new(
        direction: Direction,
        position: Point2d,
        green_duration: f64,
        yellow_duration: f64,
        all_red_duration: f64,
        initial_phase: SignalPhase,
    ) -> Self {
        Self {
            direction,
            position,
            phase: initial_phase,
            time_in_phase: 0.0,
            green_duration,
            yellow_duration,
            all_red_duration,
        }
    }

    /// The approach this light governs.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Where the light stands.
    pub fn position(&self) -> Point2d {
        self.position
    }

    /// The current signal color.
    pub fn phase(&self) -> SignalPhase {
        self.phase
    }

    /// Time since the current phase was entered, in s.
    pub fn time_in_phase(&self) -> f64 {
        self.time_in_phase
    }

    /// The configured all-red clearance time in s.
    pub fn all_red_duration(&self) -> f64 {
        self.all_red_duration
    }

    /// Sets the phase from external control. The phase clock only resets
    /// on an actual change.
    pub fn set_phase(&mut self, phase: SignalPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.time_in_phase = 0.0;
        }
    }

    /// Advances the light's internal clock.
    pub fn tick(&mut self, dt: f64) {
        self.time_in_phase += dt;
    }

    /// Whether vehicles may pass.
    pub fn can_pass(&self) -> bool {
        self.phase == SignalPhase::Green
    }

    /// Whether the current phase has run its configured duration.
    /// Red never completes on its own; leaving red is external control.
    pub fn is_phase_complete(&self) -> bool {
        match self.phase {
            SignalPhase::Green => self.time_in_phase >= self.green_duration,
            SignalPhase::Yellow => self.time_in_phase >= self.yellow_duration,
            SignalPhase::Red => false,
        }
    }

    /// Standalone transition for an uncoordinated light: green to yellow,
    /// yellow to red. Red to green is external control.
    pub fn advance_phase(&mut self) {
        match self.phase {
            SignalPhase::Green => self.set_phase(SignalPhase::Yellow),
            SignalPhase::Yellow => self.set_phase(SignalPhase::Red),
            SignalPhase::Red => {}
        }
    }

    /// Remaining time in the current phase, in s. Zero for red, whose end
    /// is decided externally.
    pub fn remaining_time(&self) -> f64 {
        match self.phase {
            SignalPhase::Green => (self.green_duration - self.time_in_phase).max(0.0),
            SignalPhase::Yellow => (self.yellow_duration - self.time_in_phase).max(0.0),
            SignalPhase::Red => 0.0,
        }
    }

    /// Resets the light to the given phase.
    pub fn reset(&mut self, phase: SignalPhase) {
        self.phase = phase;
        self.time_in_phase = 0.0;
    }
}
