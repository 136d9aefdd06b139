//! Ideal-gas state of a cylinder charge.

use serde::{Deserialize, Serialize};

/// Universal gas constant [J/(mol.K)]
pub const R_UNIVERSAL: f64 = 8.314_462_618_153_24;
/// Molar mass of air [kg/mol]
pub const MOLAR_MASS_AIR: f64 = 0.028_97;
/// Specific gas constant of air [J/(kg.K)]
pub const R_SPECIFIC: f64 = R_UNIVERSAL / MOLAR_MASS_AIR;
/// cp/cv of air
pub const GAMMA: f64 = 1.4;
/// Specific heat at constant volume [J/(kg.K)]
pub const CV: f64 = R_SPECIFIC / (GAMMA - 1.0);
/// Standard atmosphere [Pa]
pub const P_ATM: f64 = 101_325.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GasState {
    pressure: f64,    // [Pa]
    temperature: f64, // [K]
    volume: f64,      // [m³]
    mass: f64,        // [kg]
}

impl GasState {
    pub fn new(pressure: f64, temperature: f64, volume: f64, mass: f64) -> GasState {
        GasState {
            pressure,
            temperature,
            volume,
            mass: mass.max(0.0),
        }
    }

    /// Charge of air at `pressure` and `temperature` filling `volume`; mass from `PV = mRT`.
    pub fn from_ideal_gas(pressure: f64, temperature: f64, volume: f64) -> GasState {
        let mass = if temperature > 0.0 && volume > 0.0 {
            pressure * volume / (R_SPECIFIC * temperature)
        } else {
            0.0
        };
        GasState::new(pressure, temperature, volume, mass)
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
    pub fn volume(&self) -> f64 {
        self.volume
    }
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// [kg/m³], zero for an empty volume
    pub fn density(&self) -> f64 {
        if self.volume > 0.0 {
            self.mass / self.volume
        } else {
            0.0
        }
    }

    /// [m³/kg], zero for a massless charge
    pub fn specific_volume(&self) -> f64 {
        if self.mass > 0.0 {
            self.volume / self.mass
        } else {
            0.0
        }
    }

    /// Internal energy `m*cv*T` [J]
    pub fn internal_energy(&self) -> f64 {
        self.mass * CV * self.temperature
    }

    pub(crate) fn set_pressure(&mut self, pressure: f64) {
        self.pressure = pressure;
    }
    pub(crate) fn set_temperature(&mut self, temperature: f64) {
        self.temperature = temperature;
    }
    pub(crate) fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }
}

impl std::fmt::Display for GasState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pressure: {:.2} [bar]\ttemperature: {:.1} [K]\tvolume: {:.1} [cm³]\tmass: {:.1} [mg]",
            self.pressure / 1e5,
            self.temperature,
            self.volume * 1e6,
            self.mass * 1e6
        )
    }
}
