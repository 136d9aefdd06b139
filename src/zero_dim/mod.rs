//! Zero-dimensional (lumped) cylinder models.
pub mod crankshaft;
pub mod cylinder;
pub mod heat_transfer;
