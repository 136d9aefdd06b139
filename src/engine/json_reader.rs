use crate::engine::config::{CombustionKind, EngineConfig, ValveConfig};
use crate::error::{ConfigError, EngineError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine description as stored on disk. Lengths in mm, firing order as the
/// dash-separated 1-based cylinder numbers usual in workshop manuals (`"1-3-4-2"`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JsonEngine {
    pub bore: f64,   // [mm]
    pub stroke: f64, // [mm]
    pub conrod: Option<f64>, // [mm]
    pub compression_ratio: f64,
    pub firing_order: String,
    pub rpm_min: f64,
    pub rpm_max: f64,
    pub initial_rpm: Option<f64>,
    pub wall_temperature: Option<f64>, // [K]
    pub polytropic_index: Option<f64>,
    pub combustion: Option<JsonCombustion>,
    pub injector: Option<JsonInjector>,
    pub intake_valve: Option<JsonValve>,
    pub exhaust_valve: Option<JsonValve>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JsonValve {
    pub opening_angle: f64,
    pub closing_angle: f64,
    pub diameter: f64, // [mm]
    pub max_lift: f64, // [mm]
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JsonCombustion {
    pub model: String,
    pub spark_timing: f64, // [CA deg BTDC]
    pub efficiency: Option<f64>,
    pub wiebe: Option<JsonWiebe>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JsonWiebe {
    pub a: f64,
    pub m: f64,
    pub comb_duration: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JsonInjector {
    pub air_fuel_ratio: f64,
}

impl std::str::FromStr for JsonEngine {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

impl JsonEngine {
    pub fn from_file(path: impl AsRef<Path>) -> Result<JsonEngine, EngineError> {
        let path = path.as_ref();
        let json_file = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        json_file.parse()
    }

    /// Converts to SI units. Fields absent from the file keep their [`EngineConfig`] default.
    pub fn into_config(self) -> Result<EngineConfig, ConfigError> {
        let firing_order = parse_firing_order(&self.firing_order)?;
        let mut config = EngineConfig {
            cylinder_count: firing_order.len(),
            bore: self.bore * 1e-3,
            stroke: self.stroke * 1e-3,
            compression_ratio: self.compression_ratio,
            firing_order,
            rpm_min: self.rpm_min,
            rpm_max: self.rpm_max,
            initial_rpm: self.initial_rpm,
            ..EngineConfig::default()
        };

        if let Some(conrod) = self.conrod {
            // rod length over crank radius, crank radius being half the stroke
            config.rod_ratio = conrod / (0.5 * self.stroke);
        }
        if let Some(wall_temperature) = self.wall_temperature {
            config.wall_temperature = wall_temperature;
        }
        if let Some(n) = self.polytropic_index {
            config.polytropic_index = n;
        }
        if let Some(comb) = self.combustion {
            config.combustion = match comb.model.to_lowercase().as_str() {
                "wiebe" => CombustionKind::Wiebe,
                "motoring" | "none" => CombustionKind::Motoring,
                other => {
                    return Err(ConfigError::Combustion(format!(
                        "unknown combustion model `{}`",
                        other
                    )))
                }
            };
            config.spark_timing = comb.spark_timing;
            if let Some(efficiency) = comb.efficiency {
                config.combustion_efficiency = efficiency;
            }
            if let Some(wiebe) = comb.wiebe {
                config.wiebe_a = wiebe.a;
                config.wiebe_n = wiebe.m;
                config.combustion_duration = wiebe.comb_duration;
            }
        }
        if let Some(injector) = self.injector {
            config.air_fuel_ratio = injector.air_fuel_ratio;
        }
        if let Some(valve) = self.intake_valve {
            config.intake_valve = valve.into();
        }
        if let Some(valve) = self.exhaust_valve {
            config.exhaust_valve = valve.into();
        }
        Ok(config)
    }
}

impl From<JsonValve> for ValveConfig {
    fn from(valve: JsonValve) -> Self {
        ValveConfig {
            opening_angle: valve.opening_angle,
            closing_angle: valve.closing_angle,
            diameter: valve.diameter * 1e-3,
            max_lift: valve.max_lift * 1e-3,
        }
    }
}

/// `"1-3-4-2"` -> `[0, 2, 3, 1]`. Only the format is checked here; permutation checks
/// belong to [`EngineConfig::validate`].
pub fn parse_firing_order(order: &str) -> Result<Vec<usize>, ConfigError> {
    order
        .split('-')
        .map(|s| match s.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(ConfigError::FiringOrderFormat(order.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGINE: &str = r#"{
        "bore": 86.0,
        "stroke": 86.0,
        "conrod": 75.25,
        "compression_ratio": 10.5,
        "firing_order": "1-4-2-3",
        "rpm_min": 800.0,
        "rpm_max": 8000.0,
        "combustion": {
            "model": "wiebe",
            "spark_timing": 15.0,
            "wiebe": { "a": 6.9, "m": 2.0, "comb_duration": 50.0 }
        },
        "injector": { "air_fuel_ratio": 13.5 },
        "intake_valve": { "opening_angle": 350.0, "closing_angle": 590.0, "diameter": 33.0, "max_lift": 9.0 }
    }"#;

    #[test]
    fn reads_engine() {
        let json: JsonEngine = ENGINE.parse().unwrap();
        let config = json.into_config().unwrap();
        assert_eq!(config.cylinder_count, 4);
        assert_eq!(config.firing_order, vec![0, 3, 1, 2]);
        assert!((config.bore - 0.086).abs() < 1e-12);
        assert!((config.rod_ratio - 1.75).abs() < 1e-12);
        assert_eq!(config.spark_timing, 15.0);
        assert_eq!(config.wiebe_a, 6.9);
        assert_eq!(config.combustion_duration, 50.0);
        assert_eq!(config.air_fuel_ratio, 13.5);
        assert!((config.intake_valve.diameter - 0.033).abs() < 1e-12);
        assert_eq!(config.exhaust_valve, ValveConfig::exhaust());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn sample_engine_file() {
        let json: JsonEngine = include_str!("../../engine.json").parse().unwrap();
        let config = json.into_config().unwrap();
        let default = EngineConfig::default();
        assert!((config.rod_ratio - default.rod_ratio).abs() < 1e-12);
        assert_eq!(config.crank_radius_ratio, default.crank_radius_ratio);
        assert_eq!(config.firing_order, vec![0, 2, 3, 1]);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn firing_order_format() {
        assert_eq!(parse_firing_order("1-3-4-2"), Ok(vec![0, 2, 3, 1]));
        assert_eq!(parse_firing_order("1"), Ok(vec![0]));
        assert!(parse_firing_order("1-x-3").is_err());
        assert!(parse_firing_order("0-1").is_err());
        assert!(parse_firing_order("").is_err());
    }

    #[test]
    fn unknown_combustion_model() {
        let json = ENGINE.replace("\"wiebe\",", "\"diesel\",");
        let json: JsonEngine = json.parse().unwrap();
        assert!(matches!(json.into_config(), Err(ConfigError::Combustion(_))));
    }

    #[test]
    fn malformed_json() {
        let err = "{ \"bore\": 86.0 ".parse::<JsonEngine>().unwrap_err();
        assert!(matches!(err, EngineError::Json(_)));
    }
}
