//! Elements driven by the crank angle that connect a cylinder to its manifolds.
pub mod valve;
