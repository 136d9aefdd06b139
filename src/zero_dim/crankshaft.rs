//! Slider-crank kinematics and the piston riding on it.
//!
//! Lengths are normalized to the stroke: the crank radius is `r = 0.5` for a standard
//! engine and the connecting rod is `l = rod_ratio * r`. The piston position reported by
//! [`Piston`] is normalized to the stroke with `0 = TDC` and `1 = BDC`.

use crate::error::ConfigError;
use crate::numerics::ode_solvers::relax;

/// Piston temperature approached while running [K]
const PISTON_RUNNING_TEMP: f64 = 450.0;
/// Relaxation rate per second at 1000 rpm
const PISTON_TEMP_RATE: f64 = 0.001;
/// Wear per (rpm * s), scaled by `1 + acceleration²`
const PISTON_WEAR_RATE: f64 = 5e-10;
/// Upper bound keeping wear inside `[0, 1)`
pub const WEAR_LIMIT: f64 = 0.999_999;

#[derive(Debug, Clone, PartialEq)]
pub struct Crankshaft {
    crank: f64,  // [-] crank radius / stroke
    conrod: f64, // [-] rod length / stroke
}

/// Instantaneous slider-crank state at one crank angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    /// Distance from crank center to piston pin, normalized to stroke
    pub pin_distance: f64,
    /// Stroke fraction, 0 at TDC and 1 at BDC
    pub position: f64,
    /// `d(pin_distance)/d(theta)` per radian
    pub velocity: f64,
    /// `d²(pin_distance)/d(theta)²` per radian²
    pub acceleration: f64,
}

impl Crankshaft {
    /// `crank_ratio` is the crank radius over the stroke and `rod_ratio` the rod length over
    /// the crank radius. The rod must be longer than the crank, otherwise the slider-crank
    /// radicand goes non-positive at some angle.
    pub fn new(crank_ratio: f64, rod_ratio: f64) -> Result<Crankshaft, ConfigError> {
        let conrod = rod_ratio * crank_ratio;
        if !(crank_ratio > 0.0) || !(crank_ratio < conrod) || !conrod.is_finite() {
            return Err(ConfigError::CrankGeometry {
                crank_ratio,
                rod_length: conrod,
            });
        }
        Ok(Crankshaft {
            crank: crank_ratio,
            conrod,
        })
    }

    pub fn crank(&self) -> f64 {
        self.crank
    }

    pub fn conrod(&self) -> f64 {
        self.conrod
    }

    /// `l² - (r·sin θ)²`, bounded below by `l² - r² > 0`.
    fn radicand(&self, theta: f64) -> f64 {
        let s = self.crank * theta.sin();
        self.conrod * self.conrod - s * s
    }

    /// Slider-crank state at `angle` [CA deg].
    pub fn kinematics(&self, angle: f64) -> Kinematics {
        let theta = angle.to_radians();
        let r = self.crank;
        let rad = self.radicand(theta);
        let root = rad.sqrt();

        let pin_distance = r * theta.cos() + root;
        let velocity = -r * theta.sin() - (r * r * (2.0 * theta).sin()) / (2.0 * root);
        let sin_2t = (2.0 * theta).sin();
        let acceleration = -r * theta.cos()
            - r * r * (2.0 * theta).cos() / root
            - r.powi(4) * sin_2t * sin_2t / (4.0 * rad.powf(1.5));

        Kinematics {
            pin_distance,
            position: self.position_of(pin_distance),
            velocity,
            acceleration,
        }
    }

    /// Stroke fraction (0 = TDC, 1 = BDC) of a pin distance
    fn position_of(&self, pin_distance: f64) -> f64 {
        let tdc = self.crank + self.conrod;
        ((tdc - pin_distance) / (2.0 * self.crank)).clamp(0.0, 1.0)
    }

    /// Stroke fraction at `angle` [CA deg], 0 at TDC and 1 at BDC.
    pub fn stroke_fraction(&self, angle: f64) -> f64 {
        self.kinematics(angle).position
    }
}

impl Default for Crankshaft {
    /// Crank radius of half a stroke and a 1.75:1 rod ratio
    fn default() -> Self {
        Crankshaft {
            crank: 0.5,
            conrod: 0.875,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Piston {
    position: f64,     // [-] 0 = TDC, 1 = BDC
    velocity: f64,     // [1/rad]
    acceleration: f64, // [1/rad²]
    temperature: f64,  // [K]
    wear: f64,         // [-]
}

impl Piston {
    pub fn new() -> Piston {
        Piston {
            position: 0.0,
            velocity: 0.0,
            acceleration: 0.0,
            temperature: 350.0,
            wear: 0.0,
        }
    }

    /// Places the piston at `angle` [CA deg] and advances its temperature and wear over `dt` [s].
    pub fn update(&mut self, crankshaft: &Crankshaft, angle: f64, rpm: f64, dt: f64) {
        let kin = crankshaft.kinematics(angle);
        self.position = kin.position;
        self.velocity = kin.velocity;
        self.acceleration = kin.acceleration;

        self.temperature = relax(
            self.temperature,
            PISTON_RUNNING_TEMP,
            PISTON_TEMP_RATE * rpm / 1000.0,
            dt,
        );
        let d_wear = PISTON_WEAR_RATE * rpm * dt * (1.0 + kin.acceleration * kin.acceleration);
        self.wear = (self.wear + d_wear).min(WEAR_LIMIT);
    }

    pub fn position(&self) -> f64 {
        self.position
    }
    pub fn velocity(&self) -> f64 {
        self.velocity
    }
    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
    pub fn wear(&self) -> f64 {
        self.wear
    }
}

impl Default for Piston {
    fn default() -> Self {
        Piston::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radicand_stays_positive() {
        let crank = Crankshaft::default();
        let floor = 0.875f64.powi(2) - 0.25;
        for i in 0..=7200 {
            let angle = i as f64 * 0.1;
            let rad = crank.radicand(angle.to_radians());
            assert!(rad >= floor - 1e-12, "radicand {} at {}", rad, angle);
            let kin = crank.kinematics(angle);
            assert!(kin.pin_distance.is_finite());
            assert!(kin.velocity.is_finite());
            assert!(kin.acceleration.is_finite());
            assert!((0.0..=1.0).contains(&kin.position));
        }
    }

    #[test]
    fn dead_centers() {
        let crank = Crankshaft::default();
        let tdc = crank.kinematics(0.0);
        assert!(tdc.position.abs() < 1e-12);
        assert!(tdc.velocity.abs() < 1e-12);
        assert!((tdc.acceleration - (-0.5 - 0.25 / 0.875)).abs() < 1e-12);
        assert!((crank.stroke_fraction(180.0) - 1.0).abs() < 1e-12);
        assert!(crank.stroke_fraction(360.0).abs() < 1e-12);
        assert!((crank.stroke_fraction(540.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rod_shorter_than_crank_is_rejected() {
        assert!(Crankshaft::new(0.5, 1.0).is_err());
        assert!(Crankshaft::new(0.5, 0.8).is_err());
        assert!(Crankshaft::new(0.0, 1.75).is_err());
        assert!(Crankshaft::new(f64::NAN, 1.75).is_err());
        let crank = Crankshaft::new(0.5, 1.75).unwrap();
        assert_eq!(crank, Crankshaft::default());
    }

    #[test]
    fn piston_warms_up_and_wears() {
        let crank = Crankshaft::default();
        let mut piston = Piston::new();
        let mut last_wear = 0.0;
        for i in 0..1000 {
            piston.update(&crank, i as f64 * 7.0, 3000.0, 1e-3);
            assert!(piston.wear() >= last_wear);
            last_wear = piston.wear();
        }
        assert!(piston.temperature() > 350.0 && piston.temperature() < PISTON_RUNNING_TEMP);
        assert!(last_wear > 0.0 && last_wear < 1.0);
    }
}
