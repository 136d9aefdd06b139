//! # engine_cycle_simulator
//!
//! The `engine_cycle_simulator` crate simulates a multi-cylinder four-stroke engine one
//! explicit time step at a time: slider-crank kinematics, valve timing, Wiebe heat release,
//! Woschni wall heat transfer and the gas state of every cylinder, tied together by an
//! [`Engine`] that turns them into speed, torque, power and fuel figures.
//!
//! ```no_run
//! use engine_cycle_simulator::{Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::default())?;
//! for _ in 0..1000 {
//!     engine.advance(1e-4, 0.6, 0.3)?;
//! }
//! println!("{}", engine.snapshot());
//! # Ok::<(), engine_cycle_simulator::EngineError>(())
//! ```

pub mod connector;
pub mod core;
pub mod engine;
pub mod error;
pub mod numerics;
pub mod reaction;
pub mod zero_dim;

// Re-exporting
pub use crate::connector::valve::ValveState;
pub use crate::core::history::History;
pub use crate::core::traits::SaveData;
pub use crate::engine::config::{CombustionKind, EngineConfig, ValveConfig};
pub use crate::engine::engine::Engine;
pub use crate::engine::json_reader::JsonEngine;
pub use crate::engine::state::{CylinderTelemetry, EngineState};
pub use crate::error::{ConfigError, EngineError};
pub use crate::numerics::ode_solvers;
