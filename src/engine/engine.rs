use crate::engine::config::{validate_air_fuel_ratio, validate_spark_timing, EngineConfig};
use crate::engine::json_reader::JsonEngine;
use crate::engine::state::EngineState;
use crate::error::{ConfigError, EngineError};
use crate::numerics::angles::{wrap_cycle, CYCLE};
use crate::reaction::combustion::build_combustion;
use crate::zero_dim::cylinder::{Cylinder, Manifolds};
use ansi_term::Style;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Throttle applied until the first call to `advance`
pub const INITIAL_THROTTLE: f64 = 0.3;
/// Load applied until the first call to `advance`
pub const INITIAL_LOAD: f64 = 0.5;

const PEAK_TORQUE: f64 = 200.0; // [N.m]
const RPM_GAIN: f64 = 2000.0; // [RPM/s]
const RPM_DRAG: f64 = 0.1; // [1/s]
const KW_CONVERSION: f64 = 9549.0;

/// Multi-cylinder four-stroke engine driven by an explicit time step.
///
/// Every tick is computed from the crank angle and speed at its start: each cylinder sees
/// the same pre-tick RPM, and the speed is updated once, after all cylinders.
/// The engine never reads a clock.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    cylinders: Vec<Cylinder>,
    phase_offsets: Vec<f64>, // [CA deg] per cylinder
    crank_angle: f64,        // [CA deg]
    rpm: f64,
    throttle: f64,
    load: f64,
    torque: f64,           // [N.m]
    power: f64,            // [kW]
    fuel_consumption: f64, // [g/s]
    running_time: f64,     // [s]
    total_heat_release_rate: f64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Engine, EngineError> {
        config.validate()?;
        let crankshaft = config.crankshaft()?;
        let wiebe = config.wiebe()?;
        let division = CYCLE / config.cylinder_count as f64;

        let mut cylinders = Vec::with_capacity(config.cylinder_count);
        let mut phase_offsets = Vec::with_capacity(config.cylinder_count);
        for index in 0..config.cylinder_count {
            let order = firing_position(&config.firing_order, index)?;
            let offset = order as f64 * division;
            cylinders.push(Cylinder::new(
                format!("cyl_{}", index + 1),
                &config,
                crankshaft.clone(),
                build_combustion(config.combustion, wiebe),
                wrap_cycle(offset),
            )?);
            phase_offsets.push(offset);
        }

        let rpm = config.initial_rpm();
        let mut engine = Engine {
            config,
            cylinders,
            phase_offsets,
            crank_angle: 0.0,
            rpm,
            throttle: INITIAL_THROTTLE,
            load: INITIAL_LOAD,
            torque: 0.0,
            power: 0.0,
            fuel_consumption: 0.0,
            running_time: 0.0,
            total_heat_release_rate: 0.0,
        };
        engine.update_performance();
        debug!(
            cylinders = engine.cylinders.len(),
            firing_order = ?engine.config.firing_order,
            rpm = engine.rpm,
            "engine built"
        );
        Ok(engine)
    }

    /// Reads a [`JsonEngine`] file and builds the engine from it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Engine, EngineError> {
        let path = path.as_ref();
        let config = JsonEngine::from_file(path)?.into_config()?;
        debug!(path = %path.display(), "engine file loaded");
        Engine::new(config)
    }

    /// Advances the simulation by `dt` [s]. `throttle` and `load` are clamped to `[0, 1]`,
    /// NaN counting as zero. A non-positive or non-finite `dt` is rejected and the engine
    /// is left exactly as it was.
    pub fn advance(&mut self, dt: f64, throttle: f64, load: f64) -> Result<(), EngineError> {
        let sweep = self.rpm / 60.0 * 360.0 * dt; // [CA deg]
        if !(dt > 0.0) || !dt.is_finite() || !sweep.is_finite() {
            warn!(dt, "time step rejected");
            return Err(EngineError::InvalidTimeStep(dt));
        }
        self.throttle = unit_interval(throttle);
        self.load = unit_interval(load);

        let rpm = self.rpm;
        self.crank_angle = wrap_cycle(self.crank_angle + sweep);
        let manifolds = Manifolds::new(self.throttle, rpm / self.config.rpm_max);

        let crank_angle = self.crank_angle;
        self.total_heat_release_rate = self
            .cylinders
            .iter_mut()
            .zip(self.phase_offsets.iter())
            .map(|(cyl, offset)| {
                let phase = wrap_cycle(crank_angle + offset);
                cyl.advance(phase, sweep, rpm, dt, &manifolds)
            })
            .sum();

        // First-order speed law, not an inertia model
        let throttle_effect = self.throttle * 2.0 - 0.5;
        let load_effect = 1.0 - self.load * 0.8;
        let rpm_delta =
            (throttle_effect * load_effect * RPM_GAIN - (rpm - self.config.rpm_min) * RPM_DRAG) * dt;
        self.rpm = (rpm + rpm_delta).clamp(self.config.rpm_min, self.config.rpm_max);

        self.update_performance();
        self.running_time += dt;
        trace!(
            angle = self.crank_angle,
            rpm = self.rpm,
            torque = self.torque,
            heat_release = self.total_heat_release_rate,
            "tick"
        );
        Ok(())
    }

    fn update_performance(&mut self) {
        let rpm_norm = self.rpm / self.config.rpm_max;
        self.torque = PEAK_TORQUE
            * (4.0 * rpm_norm * (1.0 - rpm_norm))
            * self.throttle
            * (1.0 - 0.3 * self.load);
        self.power = self.torque * self.rpm / KW_CONVERSION;
        self.fuel_consumption = 0.1 * self.rpm * self.throttle / 3600.0;
    }

    /// Copy of the full engine state after the last completed tick.
    pub fn snapshot(&self) -> EngineState {
        EngineState {
            crank_angle: self.crank_angle,
            rpm: self.rpm,
            throttle: self.throttle,
            load: self.load,
            torque: self.torque,
            power: self.power,
            fuel_consumption: self.fuel_consumption,
            running_time: self.running_time,
            total_heat_release_rate: self.total_heat_release_rate,
            cylinders: self.cylinders.iter().map(|c| c.telemetry()).collect(),
        }
    }

    /// Degrees before firing TDC at which combustion starts, for every cylinder.
    pub fn set_spark_timing(&mut self, spark_timing: f64) -> Result<(), ConfigError> {
        validate_spark_timing(spark_timing, self.config.intake_valve.closing_angle)?;
        self.config.spark_timing = spark_timing;
        self.cylinders
            .iter_mut()
            .for_each(|c| c.set_spark_timing(spark_timing));
        Ok(())
    }

    /// Takes effect from the next combustion of each cylinder.
    pub fn set_air_fuel_ratio(&mut self, air_fuel_ratio: f64) -> Result<(), ConfigError> {
        validate_air_fuel_ratio(air_fuel_ratio)?;
        self.config.air_fuel_ratio = air_fuel_ratio;
        self.cylinders
            .iter_mut()
            .for_each(|c| c.set_air_fuel_ratio(air_fuel_ratio));
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
    pub fn cylinders(&self) -> &[Cylinder] {
        &self.cylinders
    }
    pub fn crank_angle(&self) -> f64 {
        self.crank_angle
    }
    pub fn rpm(&self) -> f64 {
        self.rpm
    }
    pub fn throttle(&self) -> f64 {
        self.throttle
    }
    pub fn load(&self) -> f64 {
        self.load
    }
    pub fn torque(&self) -> f64 {
        self.torque
    }
    pub fn power(&self) -> f64 {
        self.power
    }
    pub fn fuel_consumption(&self) -> f64 {
        self.fuel_consumption
    }
    /// Simulated time since construction [s]
    pub fn running_time(&self) -> f64 {
        self.running_time
    }
    pub fn total_heat_release_rate(&self) -> f64 {
        self.total_heat_release_rate
    }
}

/// Position of cylinder `index` in the firing sequence.
fn firing_position(firing_order: &[usize], index: usize) -> Result<usize, ConfigError> {
    firing_order
        .iter()
        .position(|&c| c == index)
        .ok_or_else(|| ConfigError::InvalidFiringOrder {
            order: firing_order.to_vec(),
            reason: format!("cylinder index {} missing", index),
        })
}

fn unit_interval(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let order: Vec<String> = self
            .config
            .firing_order
            .iter()
            .map(|c| (c + 1).to_string())
            .collect();
        writeln!(
            f,
            "{}: {} cylinders, firing order {}, {:.0}-{:.0} [RPM]",
            Style::new().bold().paint("engine"),
            self.cylinders.len(),
            order.join("-"),
            self.config.rpm_min,
            self.config.rpm_max
        )?;
        writeln!(
            f,
            "    {}",
            Style::new().underline().paint("   Operating point   ")
        )?;
        writeln!(
            f,
            "    time: {:.3} [s]  angle: {:.1} [CA deg]  speed: {:.0} [RPM]",
            self.running_time, self.crank_angle, self.rpm
        )?;
        writeln!(
            f,
            "    throttle: {:.2}  load: {:.2}  torque: {:.1} [N.m]  power: {:.2} [kW]  fuel: {:.3} [g/s]",
            self.throttle, self.load, self.torque, self.power, self.fuel_consumption
        )?;
        for cyl in self.cylinders.iter() {
            writeln!(f, "{}", cyl)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1e-4;

    #[test]
    fn phase_offsets_follow_firing_order() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        // firing order [0, 3, 1, 2]
        let phases: Vec<f64> = engine.cylinders().iter().map(|c| c.phase_angle()).collect();
        assert_eq!(phases, vec![0.0, 360.0, 540.0, 180.0]);
    }

    #[test]
    fn crank_angle_advances_with_pre_tick_rpm() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.advance(DT, 1.0, 0.0).unwrap();
        let expected = 800.0 / 60.0 * 360.0 * DT;
        assert!((engine.crank_angle() - expected).abs() < 1e-12);
        let phase = engine.cylinders()[1].phase_angle();
        assert!((phase - (expected + 360.0)).abs() < 1e-9);
    }

    #[test]
    fn rpm_control_law() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.advance(0.01, 1.0, 0.0).unwrap();
        // (1.5 * 1.0 * 2000 - 0) * 0.01
        assert!((engine.rpm() - 830.0).abs() < 1e-9);

        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.advance(0.01, 0.0, 0.0).unwrap();
        assert_eq!(engine.rpm(), 800.0);
    }

    #[test]
    fn performance_figures() {
        let config = EngineConfig {
            initial_rpm: Some(3990.0),
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config).unwrap();
        // throttle_effect 0.5, load_effect 1.0: +1000*dt, drag -(3190)*0.1*dt
        engine.advance(0.01, 0.5, 0.0).unwrap();
        let rpm = 3990.0 + (1000.0 - 3190.0 * 0.1) * 0.01;
        assert!((engine.rpm() - rpm).abs() < 1e-9);
        let n = rpm / 8000.0;
        let torque = 200.0 * 4.0 * n * (1.0 - n) * 0.5;
        assert!((engine.torque() - torque).abs() < 1e-9);
        assert!((engine.power() - torque * rpm / 9549.0).abs() < 1e-9);
        assert!((engine.fuel_consumption() - 0.1 * rpm * 0.5 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn inputs_are_clamped() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.advance(DT, 1.5, -3.0).unwrap();
        assert_eq!(engine.throttle(), 1.0);
        assert_eq!(engine.load(), 0.0);
        engine.advance(DT, f64::NAN, f64::NAN).unwrap();
        assert_eq!(engine.throttle(), 0.0);
        assert_eq!(engine.load(), 0.0);
    }

    #[test]
    fn rejected_time_step_leaves_state() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.advance(DT, 0.7, 0.2).unwrap();
        let before = engine.snapshot();
        for dt in [0.0, -1e-3, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                engine.advance(dt, 1.0, 1.0),
                Err(EngineError::InvalidTimeStep(_))
            ));
        }
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn setters_validate() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        assert!(engine.set_spark_timing(-1.0).is_err());
        assert!(engine.set_spark_timing(200.0).is_err());
        engine.set_spark_timing(20.0).unwrap();
        assert!(engine.cylinders().iter().all(|c| c.spark_timing() == 20.0));
        assert!(engine.set_air_fuel_ratio(f64::NAN).is_err());
        engine.set_air_fuel_ratio(12.5).unwrap();
        assert!(engine.cylinders().iter().all(|c| c.air_fuel_ratio() == 12.5));
    }

    #[test]
    fn heat_release_is_summed_over_cylinders() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let mut fired = false;
        for _ in 0..20_000 {
            engine.advance(DT, 0.8, 0.3).unwrap();
            let sum: f64 = engine.cylinders().iter().map(|c| c.heat_release_rate()).sum();
            assert_eq!(engine.total_heat_release_rate(), sum);
            fired |= sum > 0.0;
        }
        assert!(fired);
    }
}
