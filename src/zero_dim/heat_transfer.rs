use crate::reaction::gas::GasState;
use crate::zero_dim::crankshaft::Crankshaft;
use std::f64::consts::PI;

const C1: f64 = 2.28; // gas exchange velocity coefficient
const C2: f64 = 0.00324; // combustion velocity coefficient
const P_REF: f64 = 1e5; // [Pa]
/// Default wall temperature [K]
pub const WALL_TEMPERATURE: f64 = 400.0;

/// Convective wall heat transfer after Woschni.
#[derive(Debug, Clone, PartialEq)]
pub struct Woschni {
    bore: f64,              // [m]
    stroke: f64,            // [m]
    displacement: f64,      // [m³]
    clearance: f64,         // [m³]
    wall_area: f64,         // [m²]
    wall_temperature: f64,  // [K]
    crankshaft: Crankshaft,
}

impl Woschni {
    /// Inputs in SI units. Geometry is assumed validated by the caller.
    pub fn new(
        bore: f64,
        stroke: f64,
        compression_ratio: f64,
        wall_temperature: f64,
        crankshaft: Crankshaft,
    ) -> Woschni {
        let displacement = 0.25 * PI * bore * bore * stroke;
        Woschni {
            bore,
            stroke,
            displacement,
            clearance: displacement / (compression_ratio - 1.0),
            wall_area: PI * bore * stroke / 2.0,
            wall_temperature,
            crankshaft,
        }
    }

    /// Heat transfer coefficient [W/(m².K)] for `gas` at `speed` [RPM] and `angle` [CA deg].
    pub fn heat_transfer_coeff(&self, gas: &GasState, speed: f64, angle: f64) -> f64 {
        let press = gas.pressure();
        let temp = gas.temperature();
        if !(press > 0.0) || !(temp > 0.0) {
            return 0.0;
        }
        let mean_piston_speed = 2.0 * self.stroke * speed.max(0.0) / 60.0;
        let vol = self.clearance + self.displacement * self.crankshaft.stroke_fraction(angle);
        let w = C1 * mean_piston_speed + C2 * self.displacement * temp / (vol * P_REF);
        3.26 * (press / 1e5).powf(0.8) * w.powf(0.8) * self.bore.powf(-0.2) * temp.powf(-0.55)
    }

    /// Heat flowing from the gas into the walls, in `[J/CA-deg]`. Negative when the walls
    /// are hotter than the gas. Zero for a stopped engine.
    pub fn calculate(&self, gas: &GasState, speed: f64, angle: f64) -> f64 {
        if !(speed > 0.0) {
            return 0.0;
        }
        let h = self.heat_transfer_coeff(gas, speed, angle);
        let q = h * self.wall_area * (gas.temperature() - self.wall_temperature); // [W]
        q * (PI / 180.0) * (60.0 / speed)
    }

    pub fn wall_temperature(&self) -> f64 {
        self.wall_temperature
    }

    pub fn wall_area(&self) -> f64 {
        self.wall_area
    }
}
