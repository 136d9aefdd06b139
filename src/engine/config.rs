//! Programmatic engine configuration in SI units.

use crate::connector::valve::Valve;
use crate::error::ConfigError;
use crate::numerics::angles::CYCLE;
use crate::reaction::combustion::{WiebeFunction, WIEBE_A, WIEBE_N};
use crate::reaction::thermo::POLYTROPIC_INDEX;
use crate::zero_dim::crankshaft::Crankshaft;
use crate::zero_dim::heat_transfer::WALL_TEMPERATURE;
use serde::{Deserialize, Serialize};

pub use crate::reaction::combustion::CombustionKind;

/// Everything needed to build an [`Engine`](crate::Engine). Missing fields in a serialized
/// configuration take their default value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub cylinder_count: usize,
    pub bore: f64,              // [m]
    pub stroke: f64,            // [m]
    pub compression_ratio: f64, // [-]
    /// Zero-based cylinder indices in firing sequence
    pub firing_order: Vec<usize>,
    pub rpm_min: f64,
    pub rpm_max: f64,
    /// Starting speed, `rpm_min` when absent
    pub initial_rpm: Option<f64>,
    /// Crank radius over stroke
    pub crank_radius_ratio: f64,
    /// Rod length over crank radius
    pub rod_ratio: f64,
    /// Start of combustion before firing TDC [CA deg]
    pub spark_timing: f64,
    pub combustion_duration: f64,   // [CA deg]
    pub combustion_efficiency: f64, // [-]
    pub air_fuel_ratio: f64,        // [-] mass basis
    pub combustion: CombustionKind,
    pub wiebe_a: f64,
    pub wiebe_n: f64,
    pub polytropic_index: f64,
    pub wall_temperature: f64, // [K]
    pub intake_valve: ValveConfig,
    pub exhaust_valve: ValveConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cylinder_count: 4,
            bore: 0.086,
            stroke: 0.086,
            compression_ratio: 10.5,
            firing_order: vec![0, 3, 1, 2],
            rpm_min: 800.0,
            rpm_max: 8000.0,
            initial_rpm: None,
            crank_radius_ratio: 0.5,
            rod_ratio: 1.75,
            spark_timing: 10.0,
            combustion_duration: 40.0,
            combustion_efficiency: 0.95,
            air_fuel_ratio: 14.7,
            combustion: CombustionKind::Wiebe,
            wiebe_a: WIEBE_A,
            wiebe_n: WIEBE_N,
            polytropic_index: POLYTROPIC_INDEX,
            wall_temperature: WALL_TEMPERATURE,
            intake_valve: ValveConfig::intake(),
            exhaust_valve: ValveConfig::exhaust(),
        }
    }
}

impl EngineConfig {
    /// Checks every construction-time constraint. The first violation found is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cylinder_count == 0 {
            return Err(ConfigError::NoCylinders);
        }
        self.validate_firing_order()?;
        if !(self.bore > 0.0) || !self.bore.is_finite() {
            return Err(ConfigError::NonPositiveBore(self.bore));
        }
        if !(self.stroke > 0.0) || !self.stroke.is_finite() {
            return Err(ConfigError::NonPositiveStroke(self.stroke));
        }
        if !(self.compression_ratio > 1.0) || !self.compression_ratio.is_finite() {
            return Err(ConfigError::CompressionRatio(self.compression_ratio));
        }
        if !(self.rpm_min >= 0.0) || !(self.rpm_min < self.rpm_max) || !self.rpm_max.is_finite() {
            return Err(ConfigError::RpmRange {
                min: self.rpm_min,
                max: self.rpm_max,
            });
        }
        let rpm = self.initial_rpm();
        if !(rpm >= self.rpm_min && rpm <= self.rpm_max) {
            return Err(ConfigError::InitialRpm {
                rpm,
                min: self.rpm_min,
                max: self.rpm_max,
            });
        }
        self.crankshaft()?;
        let intake = self.intake_valve.build("intake".to_string())?;
        self.exhaust_valve.build("exhaust".to_string())?;
        self.validate_combustion(intake.closing_angle())?;
        if !(self.polytropic_index >= 1.0) || !self.polytropic_index.is_finite() {
            return Err(ConfigError::Combustion(format!(
                "polytropic index must be at least one: {}",
                self.polytropic_index
            )));
        }
        if !(self.wall_temperature > 0.0) || !self.wall_temperature.is_finite() {
            return Err(ConfigError::Combustion(format!(
                "wall temperature must be positive: {} [K]",
                self.wall_temperature
            )));
        }
        Ok(())
    }

    fn validate_firing_order(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidFiringOrder {
            order: self.firing_order.clone(),
            reason,
        };
        if self.firing_order.len() != self.cylinder_count {
            return Err(invalid(format!(
                "expected {} entries, found {}",
                self.cylinder_count,
                self.firing_order.len()
            )));
        }
        let mut seen = vec![false; self.cylinder_count];
        for &cyl in self.firing_order.iter() {
            match seen.get_mut(cyl) {
                None => return Err(invalid(format!("cylinder index {} out of range", cyl))),
                Some(true) => return Err(invalid(format!("cylinder index {} repeated", cyl))),
                Some(flag) => *flag = true,
            }
        }
        Ok(())
    }

    fn validate_combustion(&self, intake_closing: f64) -> Result<(), ConfigError> {
        validate_spark_timing(self.spark_timing, intake_closing)?;
        validate_air_fuel_ratio(self.air_fuel_ratio)?;
        if !(self.combustion_duration > 0.0) || !(self.combustion_duration < CYCLE) {
            return Err(ConfigError::Combustion(format!(
                "combustion duration must lie in (0, 720): {} [CA deg]",
                self.combustion_duration
            )));
        }
        if !(0.0..=1.0).contains(&self.combustion_efficiency) {
            return Err(ConfigError::Combustion(format!(
                "combustion efficiency must lie in [0, 1]: {}",
                self.combustion_efficiency
            )));
        }
        self.wiebe()?;
        Ok(())
    }

    /// Starting speed [RPM]
    pub fn initial_rpm(&self) -> f64 {
        self.initial_rpm.unwrap_or(self.rpm_min)
    }

    pub fn crankshaft(&self) -> Result<Crankshaft, ConfigError> {
        Crankshaft::new(self.crank_radius_ratio, self.rod_ratio)
    }

    pub fn wiebe(&self) -> Result<WiebeFunction, ConfigError> {
        WiebeFunction::new(self.wiebe_a, self.wiebe_n)
    }
}

/// The spark must fire after the charge is trapped and before firing TDC.
pub(crate) fn validate_spark_timing(spark_timing: f64, intake_closing: f64) -> Result<(), ConfigError> {
    if !(spark_timing >= 0.0) || !(spark_timing < CYCLE - intake_closing) {
        return Err(ConfigError::Combustion(format!(
            "spark timing must lie in [0, {}) [CA deg BTDC]: {}",
            CYCLE - intake_closing,
            spark_timing
        )));
    }
    Ok(())
}

pub(crate) fn validate_air_fuel_ratio(air_fuel_ratio: f64) -> Result<(), ConfigError> {
    if !(air_fuel_ratio > 0.0) || !air_fuel_ratio.is_finite() {
        return Err(ConfigError::Combustion(format!(
            "air-fuel ratio must be positive: {}",
            air_fuel_ratio
        )));
    }
    Ok(())
}

/// Timing and size of one valve. Angles are cycle-relative, 0 at firing TDC.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ValveConfig {
    pub opening_angle: f64, // [CA deg]
    pub closing_angle: f64, // [CA deg]
    pub diameter: f64,      // [m]
    pub max_lift: f64,      // [m]
}

impl ValveConfig {
    pub fn intake() -> ValveConfig {
        ValveConfig {
            opening_angle: 340.0,
            closing_angle: 580.0,
            diameter: 0.035,
            max_lift: 0.01,
        }
    }

    pub fn exhaust() -> ValveConfig {
        ValveConfig {
            opening_angle: 140.0,
            closing_angle: 380.0,
            diameter: 0.030,
            max_lift: 0.01,
        }
    }

    pub fn build(&self, name: String) -> Result<Valve, ConfigError> {
        Valve::new(
            name,
            self.opening_angle,
            self.closing_angle,
            self.diameter,
            self.max_lift,
        )
    }
}
