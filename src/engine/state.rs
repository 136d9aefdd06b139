//! Immutable snapshots of the engine, produced by value after each tick.

use crate::connector::valve::ValveState;
use crate::core::traits::SaveData;
use ansi_term::Style;
use ndarray::{arr1, Array1};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EngineState {
    pub crank_angle: f64,      // [CA deg]
    pub rpm: f64,
    pub throttle: f64,         // [-]
    pub load: f64,             // [-]
    pub torque: f64,           // [N.m]
    pub power: f64,            // [kW]
    pub fuel_consumption: f64, // [g/s]
    pub running_time: f64,     // [s]
    /// Sum of the cylinders' heat release rates [J/CA-deg]
    pub total_heat_release_rate: f64,
    pub cylinders: Vec<CylinderTelemetry>,
}

/// Per-cylinder part of [`EngineState`], in display units.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CylinderTelemetry {
    pub name: String,
    pub phase_angle: f64,         // [CA deg]
    pub pressure: f64,            // [bar]
    pub temperature: f64,         // [K]
    pub volume: f64,              // [cm³]
    pub mass: f64,                // [mg]
    pub intake_valve_lift: f64,   // [mm]
    pub exhaust_valve_lift: f64,  // [mm]
    #[serde(with = "valve_state")]
    pub intake_valve_state: ValveState,
    #[serde(with = "valve_state")]
    pub exhaust_valve_state: ValveState,
    pub piston_position: f64,     // [% of stroke] 0 at TDC
    pub piston_velocity: f64,     // [-]
    pub piston_acceleration: f64, // [-]
    pub vibration: f64,
    pub combustion_progress: f64, // [-]
    pub heat_release_rate: f64,   // [J/CA-deg]
    pub heat_added: f64,          // [J] this cycle
    pub work_done: f64,           // [J] this cycle
    pub heat_loss: f64,           // [J] cumulative
    pub piston_temperature: f64,  // [K]
    pub piston_wear: f64,
    pub intake_valve_temperature: f64, // [K]
    pub intake_valve_wear: f64,
    pub exhaust_valve_temperature: f64, // [K]
    pub exhaust_valve_wear: f64,
}

/// Valve states travel as lowercase strings.
mod valve_state {
    use crate::connector::valve::ValveState;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(state: &ValveState, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(state)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ValveState, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "closed" => Ok(ValveState::Closed),
            "opening" => Ok(ValveState::Opening),
            "closing" => Ok(ValveState::Closing),
            other => Err(D::Error::custom(format!("unknown valve state `{}`", other))),
        }
    }
}

fn state_code(state: ValveState) -> f64 {
    match state {
        ValveState::Closed => 0.0,
        ValveState::Opening => 1.0,
        ValveState::Closing => 2.0,
    }
}

impl SaveData for EngineState {
    fn get_headers(&self) -> String {
        "crank_angle [CA deg]\trpm\tthrottle\tload\ttorque [N.m]\tpower [kW]\tfuel [g/s]\ttime [s]\theat_release [J/CA deg]"
            .to_string()
    }

    fn num_storable_variables(&self) -> usize {
        9
    }

    fn get_storable_data(&self) -> Array1<f64> {
        arr1(&[
            self.crank_angle,
            self.rpm,
            self.throttle,
            self.load,
            self.torque,
            self.power,
            self.fuel_consumption,
            self.running_time,
            self.total_heat_release_rate,
        ])
    }
}

impl SaveData for CylinderTelemetry {
    fn get_headers(&self) -> String {
        let n = &self.name;
        format!(
            "{n}_angle [CA deg]\t{n}_pressure [bar]\t{n}_temperature [K]\t{n}_volume [cm³]\t\
             {n}_intake_lift [mm]\t{n}_exhaust_lift [mm]\t{n}_intake_state\t{n}_exhaust_state\t\
             {n}_position [%]\t{n}_vibration\t{n}_mfb\t{n}_heat_release [J/CA deg]",
            n = n
        )
    }

    fn num_storable_variables(&self) -> usize {
        12
    }

    fn get_storable_data(&self) -> Array1<f64> {
        arr1(&[
            self.phase_angle,
            self.pressure,
            self.temperature,
            self.volume,
            self.intake_valve_lift,
            self.exhaust_valve_lift,
            state_code(self.intake_valve_state),
            state_code(self.exhaust_valve_state),
            self.piston_position,
            self.vibration,
            self.combustion_progress,
            self.heat_release_rate,
        ])
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} {:.1} [s]  angle: {:.1} [CA deg]  speed: {:.0} [RPM]  throttle: {:.2}  load: {:.2}",
            Style::new().bold().paint("engine @"),
            self.running_time,
            self.crank_angle,
            self.rpm,
            self.throttle,
            self.load
        )?;
        writeln!(
            f,
            "  torque: {:.1} [N.m]  power: {:.2} [kW]  fuel: {:.3} [g/s]",
            self.torque, self.power, self.fuel_consumption
        )?;
        for cyl in self.cylinders.iter() {
            writeln!(
                f,
                "  {:<6} {:>6.1} [CA deg] {:>7.2} [bar] {:>7.1} [K]  iv {:>5.2} [mm] ({})  ev {:>5.2} [mm] ({})  mfb {:.3}",
                Style::new().bold().paint(cyl.name.as_str()),
                cyl.phase_angle,
                cyl.pressure,
                cyl.temperature,
                cyl.intake_valve_lift,
                cyl.intake_valve_state,
                cyl.exhaust_valve_lift,
                cyl.exhaust_valve_state,
                cyl.combustion_progress
            )?;
        }
        Ok(())
    }
}
