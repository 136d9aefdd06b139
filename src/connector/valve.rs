use crate::error::ConfigError;
use crate::numerics::angles::{wrap_cycle, CYCLE};
use crate::numerics::ode_solvers::relax;
use crate::zero_dim::crankshaft::WEAR_LIMIT;
use std::f64::consts::PI;

const VALVE_HOT_TEMP: f64 = 1000.0; // [K] approached while open
const VALVE_COLD_TEMP: f64 = 300.0; // [K] approached while closed
const VALVE_HEATING_RATE: f64 = 0.01; // [1/s] at 1000 rpm
const VALVE_COOLING_RATE: f64 = 0.005; // [1/s]
const VALVE_WEAR_RATE: f64 = 1e-9; // per (rpm * s) while off its seat
const FLOW_COEFF: f64 = 0.85;

/// Where the valve is in its lift event. Open valves are either still rising
/// (`Opening`) or past peak lift (`Closing`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValveState {
    Closed,
    Opening,
    Closing,
}

impl std::fmt::Display for ValveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValveState::Closed => "closed",
            ValveState::Opening => "opening",
            ValveState::Closing => "closing",
        };
        write!(f, "{}", s)
    }
}

/// Valve driven by the phase angle of its cylinder.
///
/// The lift follows `max_lift * sin²(π * pos)` between `opening_angle` and `closing_angle`.
/// The profile is smooth inside the event and its derivative vanishes at both ends, so the
/// only break is in the second derivative where the valve meets its seat.
#[derive(Debug, Clone, PartialEq)]
pub struct Valve {
    name: String,
    opening_angle: f64, // [CA deg]
    closing_angle: f64, // [CA deg]
    diameter: f64,      // [m]
    max_lift: f64,      // [m]
    lift: f64,          // [m]
    state: ValveState,
    temperature: f64, // [K]
    wear: f64,        // [-]
}

impl Valve {
    /// Creates a closed valve. Angles in CA degrees inside one cycle, lengths in meters.
    pub fn new(
        name: String,
        opening_angle: f64,
        closing_angle: f64,
        diameter: f64,
        max_lift: f64,
    ) -> Result<Valve, ConfigError> {
        let error = |reason: String| ConfigError::ValveTiming {
            valve: name.clone(),
            reason,
        };
        if !(0.0..CYCLE).contains(&opening_angle) || !(closing_angle <= CYCLE) {
            return Err(error(format!(
                "angles must lie within one cycle [0, 720]: {} -> {}",
                opening_angle, closing_angle
            )));
        }
        if !(opening_angle < closing_angle) {
            return Err(error(format!(
                "opening angle ({}) must precede closing angle ({})",
                opening_angle, closing_angle
            )));
        }
        if !(diameter > 0.0) {
            return Err(error(format!("diameter must be positive: {}", diameter)));
        }
        if !(max_lift > 0.0) {
            return Err(error(format!("max lift must be positive: {}", max_lift)));
        }
        Ok(Valve {
            name,
            opening_angle,
            closing_angle,
            diameter,
            max_lift,
            lift: 0.0,
            state: ValveState::Closed,
            temperature: VALVE_COLD_TEMP,
            wear: 0.0,
        })
    }

    /// Lift [m] and state at `angle` [CA deg], without touching the valve.
    pub fn lift_at(&self, angle: f64) -> (f64, ValveState) {
        let cycle_angle = wrap_cycle(angle);
        if self.opening_angle <= cycle_angle && cycle_angle < self.closing_angle {
            let pos = (cycle_angle - self.opening_angle) / (self.closing_angle - self.opening_angle);
            let s = (PI * pos).sin();
            let state = if pos < 0.5 {
                ValveState::Opening
            } else {
                ValveState::Closing
            };
            (self.max_lift * s * s, state)
        } else {
            (0.0, ValveState::Closed)
        }
    }

    /// Moves the valve to `angle` [CA deg] and advances its temperature and wear over `dt` [s].
    pub fn update(&mut self, angle: f64, rpm: f64, dt: f64) {
        let (lift, state) = self.lift_at(angle);
        self.lift = lift;
        self.state = state;

        if self.is_open() {
            self.temperature = relax(
                self.temperature,
                VALVE_HOT_TEMP,
                VALVE_HEATING_RATE * rpm / 1000.0,
                dt,
            );
            self.wear = (self.wear + VALVE_WEAR_RATE * rpm * dt).min(WEAR_LIMIT);
        } else {
            self.temperature = relax(self.temperature, VALVE_COLD_TEMP, VALVE_COOLING_RATE, dt);
        }
    }

    /// Effective flow area [m²], derated by wear.
    pub fn area(&self) -> f64 {
        let effective_lift = self.lift * (1.0 - 0.5 * self.wear);
        if effective_lift > 0.0 {
            PI * self.diameter * effective_lift * FLOW_COEFF
        } else {
            0.0
        }
    }

    pub fn is_open(&self) -> bool {
        self.state != ValveState::Closed
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn opening_angle(&self) -> f64 {
        self.opening_angle
    }
    pub fn closing_angle(&self) -> f64 {
        self.closing_angle
    }
    pub fn diameter(&self) -> f64 {
        self.diameter
    }
    pub fn max_lift(&self) -> f64 {
        self.max_lift
    }
    pub fn lift(&self) -> f64 {
        self.lift
    }
    pub fn state(&self) -> ValveState {
        self.state
    }
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
    pub fn wear(&self) -> f64 {
        self.wear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake() -> Valve {
        Valve::new("intake".to_string(), 340.0, 580.0, 0.035, 0.01).unwrap()
    }

    #[test]
    fn peak_lift_at_midpoint() {
        let mut valve = intake();
        valve.update(460.0, 3000.0, 1e-3);
        assert_eq!(valve.lift(), valve.max_lift());
        assert_eq!(valve.state(), ValveState::Closing);
        // same point one cycle later
        let (lift, _) = valve.lift_at(460.0 + 720.0);
        assert_eq!(lift, 0.01);
    }

    #[test]
    fn state_machine() {
        let valve = intake();
        assert_eq!(valve.state(), ValveState::Closed);
        assert_eq!(valve.lift_at(339.9).1, ValveState::Closed);
        assert_eq!(valve.lift_at(340.0), (0.0, ValveState::Opening));
        assert_eq!(valve.lift_at(400.0).1, ValveState::Opening);
        assert_eq!(valve.lift_at(500.0).1, ValveState::Closing);
        assert_eq!(valve.lift_at(580.0), (0.0, ValveState::Closed));
    }

    #[test]
    fn lift_is_continuous_and_non_negative() {
        let valve = intake();
        let mut last = 0.0;
        for i in 0..72000 {
            let (lift, _) = valve.lift_at(i as f64 * 0.01);
            assert!(lift >= 0.0 && lift <= valve.max_lift());
            assert!((lift - last).abs() < 1e-5);
            last = lift;
        }
    }

    #[test]
    fn wear_only_while_open() {
        let mut valve = intake();
        valve.update(100.0, 6000.0, 0.01);
        assert_eq!(valve.wear(), 0.0);
        assert_eq!(valve.area(), 0.0);
        valve.update(400.0, 6000.0, 0.01);
        let w = valve.wear();
        assert!(w > 0.0);
        assert!(valve.temperature() > VALVE_COLD_TEMP);
        valve.update(100.0, 6000.0, 0.01);
        assert_eq!(valve.wear(), w);
        assert!(valve.area() == 0.0);
    }

    #[test]
    fn area_derated_by_wear() {
        let mut valve = intake();
        valve.update(460.0, 1000.0, 1e-3);
        let expected = PI * 0.035 * 0.01 * (1.0 - 0.5 * valve.wear()) * FLOW_COEFF;
        assert!((valve.area() - expected).abs() < 1e-15);
    }

    #[test]
    fn invalid_timing() {
        assert!(Valve::new("v".into(), 580.0, 340.0, 0.03, 0.01).is_err());
        assert!(Valve::new("v".into(), 100.0, 800.0, 0.03, 0.01).is_err());
        assert!(Valve::new("v".into(), 100.0, 200.0, 0.0, 0.01).is_err());
        assert!(Valve::new("v".into(), 100.0, 200.0, 0.03, -1.0).is_err());
    }
}
