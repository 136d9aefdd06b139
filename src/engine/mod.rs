//! Multi-cylinder coordinator, its configuration and the snapshots it publishes.
pub mod config;
#[allow(clippy::module_inception)]
pub mod engine;
pub mod json_reader;
pub mod state;
