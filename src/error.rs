//! Error types returned by engine construction and by `Engine::advance`.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid engine configuration. Detected once, at construction, and fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("engine must have at least one cylinder")]
    NoCylinders,

    #[error("invalid firing order {order:?}: {reason}")]
    InvalidFiringOrder { order: Vec<usize>, reason: String },

    #[error("unable to parse firing order `{0}`")]
    FiringOrderFormat(String),

    #[error("bore must be greater than zero: {0} [m]")]
    NonPositiveBore(f64),

    #[error("stroke must be greater than zero: {0} [m]")]
    NonPositiveStroke(f64),

    #[error("compression ratio must be greater than one: {0}")]
    CompressionRatio(f64),

    #[error("rpm range is empty or negative: min = {min}, max = {max}")]
    RpmRange { min: f64, max: f64 },

    #[error("initial rpm {rpm} outside [{min}, {max}]")]
    InitialRpm { rpm: f64, min: f64, max: f64 },

    #[error("crank radius ratio ({crank_ratio}) must be positive and shorter than the rod ({rod_length})")]
    CrankGeometry { crank_ratio: f64, rod_length: f64 },

    #[error("valve `{valve}`: {reason}")]
    ValveTiming { valve: String, reason: String },

    #[error("combustion parameters: {0}")]
    Combustion(String),
}

/// Top-level error of the crate.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The time step of `advance` must be finite and strictly positive.
    /// The engine state is left untouched.
    #[error("time step must be finite and greater than zero: dt = {0} [s]")]
    InvalidTimeStep(f64),

    #[error("unable to read `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse engine file: {0}")]
    Json(#[from] serde_json::Error),
}
