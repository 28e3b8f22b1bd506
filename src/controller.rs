//! Fixed-cycle coordination of the traffic lights.

use crate::config::SignalControlConfig;
use crate::direction::{Direction, PerDirection};
use crate::light::{SignalPhase, TrafficLight};

/// One state of the six-state fixed signal cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ControlPhase {
    NorthSouthGreen,
    NorthSouthYellow,
    AllRed1,
    EastWestGreen,
    EastWestYellow,
    AllRed2,
}

impl ControlPhase {
    /// The six states in cycle order.
    pub const ORDER: [ControlPhase; 6] = [
        ControlPhase::NorthSouthGreen,
        ControlPhase::NorthSouthYellow,
        ControlPhase::AllRed1,
        ControlPhase::EastWestGreen,
        ControlPhase::EastWestYellow,
        ControlPhase::AllRed2,
    ];

    /// The state that follows this one. Leaving [ControlPhase::AllRed2]
    /// wraps the cycle.
    fn next(self) -> ControlPhase {
        match self {
            ControlPhase::NorthSouthGreen => ControlPhase::NorthSouthYellow,
            ControlPhase::NorthSouthYellow => ControlPhase::AllRed1,
            ControlPhase::AllRed1 => ControlPhase::EastWestGreen,
            ControlPhase::EastWestGreen => ControlPhase::EastWestYellow,
            ControlPhase::EastWestYellow => ControlPhase::AllRed2,
            ControlPhase::AllRed2 => ControlPhase::NorthSouthGreen,
        }
    }

    /// The signal color each direction shows while this state is active.
    fn assignment(self) -> PerDirection<SignalPhase> {
        use SignalPhase::*;
        match self {
            ControlPhase::NorthSouthGreen => PerDirection::new(Green, Green, Red, Red),
            ControlPhase::NorthSouthYellow => PerDirection::new(Yellow, Yellow, Red, Red),
            ControlPhase::EastWestGreen => PerDirection::new(Red, Red, Green, Green),
            ControlPhase::EastWestYellow => PerDirection::new(Red, Red, Yellow, Yellow),
            ControlPhase::AllRed1 | ControlPhase::AllRed2 => {
                PerDirection::new(Red, Red, Red, Red)
            }
        }
    }
}

/// Coordinates the traffic lights through a fixed cycle.
///
/// Lights never self-transition under this controller; each state change
/// is pushed into every light.
pub struct SignalController {
    lights: PerDirection<Option<TrafficLight>>,
    timing: SignalControlConfig,
    current_phase: ControlPhase,
    /// Time since the current control phase was entered, in s.
    time_in_phase: f64,
    cycle_count: u64,
}

impl SignalController {
    /// Creates a controller starting in [ControlPhase::NorthSouthGreen]
    /// and pushes that initial assignment to the lights.
    pub fn new(lights: PerDirection<Option<TrafficLight>>, timing: SignalControlConfig) -> Self {
        let mut controller = Self {
            lights,
            timing,
            current_phase: ControlPhase::NorthSouthGreen,
            time_in_phase: 0.0,
            cycle_count: 0,
        };
        controller.apply_current_phase();
        controller
    }

    /// Advances the controller by one time step: accumulates phase time,
    /// ticks every light's internal clock, then checks the single phase
    /// threshold.
    pub fn update(&mut self, dt: f64) {
        self.time_in_phase += dt;

        for dir in Direction::ALL {
            if let Some(light) = self.lights[dir].as_mut() {
                light.tick(dt);
            }
        }

        if self.time_in_phase >= self.phase_duration(self.current_phase) {
            self.advance_phase();
        }
    }

    fn phase_duration(&self, phase: ControlPhase) -> f64 {
        match phase {
            ControlPhase::NorthSouthGreen => self.timing.green_north_south,
            ControlPhase::EastWestGreen => self.timing.green_east_west,
            ControlPhase::NorthSouthYellow | ControlPhase::EastWestYellow => self.timing.yellow,
            ControlPhase::AllRed1 | ControlPhase::AllRed2 => self.timing.all_red,
        }
    }

    fn advance_phase(&mut self) {
        if self.current_phase == ControlPhase::AllRed2 {
            self.cycle_count += 1;
        }
        self.current_phase = self.current_phase.next();
        self.time_in_phase = 0.0;
        self.apply_current_phase();
    }

    fn apply_current_phase(&mut self) {
        let assignment = self.current_phase.assignment();
        for dir in Direction::ALL {
            if let Some(light) = self.lights[dir].as_mut() {
                light.set_phase(assignment[dir]);
            }
        }
    }

    /// The light for a direction, if that approach has one.
    pub fn light(&self, direction: Direction) -> Option<&TrafficLight> {
        self.lights[direction].as_ref()
    }

    /// The signal color currently shown to a direction. Directions with
    /// no light read as red.
    pub fn phase(&self, direction: Direction) -> SignalPhase {
        self.lights[direction]
            .as_ref()
            .map(|l| l.phase())
            .unwrap_or(SignalPhase::Red)
    }

    /// The active control phase.
    pub fn current_phase(&self) -> ControlPhase {
        self.current_phase
    }

    /// The number of completed cycles.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Elapsed time within the current cycle: the durations of the
    /// completed phases plus the time spent in the current one.
    pub fn time_in_cycle(&self) -> f64 {
        let completed: f64 = ControlPhase::ORDER
            .iter()
            .take_while(|p| **p != self.current_phase)
            .map(|p| self.phase_duration(*p))
            .sum();
        completed + self.time_in_phase
    }

    /// The configured cycle length in s.
    pub fn cycle_length(&self) -> f64 {
        self.timing.cycle_length
    }

    /// Returns to the start of the cycle and re-applies the initial
    /// assignment.
    pub fn reset(&mut self) {
        self.current_phase = ControlPhase::NorthSouthGreen;
        self.time_in_phase = 0.0;
        self.cycle_count = 0;
        for dir in Direction::ALL {
            if let Some(light) = self.lights[dir].as_mut() {
                light.reset(SignalPhase::Red);
            }
        }
        self.apply_current_phase();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::math::Point2d;
    use assert_approx_eq::assert_approx_eq;

    fn controller() -> SignalController {
        let timing = SimulationConfig::default().signal_control;
        let lights = PerDirection::from_fn(|dir| {
            Some(TrafficLight::new(
                dir,
                Point2d::new(0.0, 0.0),
                30.0,
                timing.yellow,
                timing.all_red,
                SignalPhase::Red,
            ))
        });
        SignalController::new(lights, timing)
    }

    fn non_red_axes(controller: &SignalController) -> (bool, bool) {
        let ns = controller.phase(Direction::North) != SignalPhase::Red
            || controller.phase(Direction::South) != SignalPhase::Red;
        let ew = controller.phase(Direction::East) != SignalPhase::Red
            || controller.phase(Direction::West) != SignalPhase::Red;
        (ns, ew)
    }

    #[test]
    fn starts_with_north_south_green() {
        let controller = controller();
        assert_eq!(controller.current_phase(), ControlPhase::NorthSouthGreen);
        assert_eq!(controller.phase(Direction::North), SignalPhase::Green);
        assert_eq!(controller.phase(Direction::South), SignalPhase::Green);
        assert_eq!(controller.phase(Direction::East), SignalPhase::Red);
        assert_eq!(controller.phase(Direction::West), SignalPhase::Red);
    }

    #[test]
    fn reaches_east_west_green_at_35_seconds() {
        // 30s green + 3s yellow + 2s all-red.
        let mut controller = controller();
        let dt = 0.5;
        let mut t = 0.0;
        while t < 35.0 {
            controller.update(dt);
            t += dt;
        }
        assert_eq!(controller.current_phase(), ControlPhase::EastWestGreen);
        assert_eq!(controller.phase(Direction::East), SignalPhase::Green);
        assert_approx_eq!(controller.time_in_cycle(), 35.0);
    }

    #[test]
    fn axes_are_never_both_non_red() {
        let mut controller = controller();
        for _ in 0..1400 {
            controller.update(0.25);
            let (ns, ew) = non_red_axes(&controller);
            assert!(!(ns && ew));
        }
    }

    #[test]
    fn cycle_count_increments_every_cycle_length() {
        let mut controller = controller();
        let dt = 1.0;
        for _ in 0..70 {
            controller.update(dt);
        }
        assert_eq!(controller.cycle_count(), 1);
        assert_eq!(controller.current_phase(), ControlPhase::NorthSouthGreen);
        for _ in 0..70 {
            controller.update(dt);
        }
        assert_eq!(controller.cycle_count(), 2);
    }

    #[test]
    fn three_way_controller_skips_missing_light() {
        let timing = SimulationConfig::default().signal_control;
        let mut lights = PerDirection::from_fn(|dir| {
            Some(TrafficLight::new(
                dir,
                Point2d::new(0.0, 0.0),
                30.0,
                timing.yellow,
                timing.all_red,
                SignalPhase::Red,
            ))
        });
        lights[Direction::West] = None;
        let controller = SignalController::new(lights, timing);
        assert_eq!(controller.phase(Direction::West), SignalPhase::Red);
        assert!(controller.light(Direction::West).is_none());
    }

    #[test]
    fn reset_restarts_the_cycle() {
        let mut controller = controller();
        for _ in 0..50 {
            controller.update(1.0);
        }
        controller.reset();
        assert_eq!(controller.current_phase(), ControlPhase::NorthSouthGreen);
        assert_eq!(controller.cycle_count(), 0);
        assert_approx_eq!(controller.time_in_cycle(), 0.0);
        assert_eq!(controller.phase(Direction::North), SignalPhase::Green);
    }
}
