//! Small numerical helpers shared by the engine components
pub mod angles;
pub mod ode_solvers;
