//! Gas state, thermodynamic transitions and combustion heat release.
pub mod combustion;
pub mod gas;
pub mod thermo;
