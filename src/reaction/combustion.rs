use crate::error::ConfigError;
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};

/// Default Wiebe efficiency parameter
pub const WIEBE_A: f64 = 5.0;
/// Default Wiebe shape exponent
pub const WIEBE_N: f64 = 2.0;
/// Lower heating value of gasoline [J/kg]
pub const FUEL_LHV: f64 = 44e6;

pub trait Combustion: DynClone + std::fmt::Debug {
    fn model_name(&self) -> &str;
    /// Returns the heat release rate in `[J/CA-deg]`.
    /// `angle` and `ini_combustion` in CA degrees, `comb_duration` in CA degrees, `total_heat` in J.
    fn get_heat_release_rate(
        &self,
        angle: f64,
        ini_combustion: f64,
        comb_duration: f64,
        total_heat: f64,
        efficiency: f64,
    ) -> f64;
    /// Mass fraction burned at `angle`: 0 before the window, `mfb(1)` after it.
    fn burned_mass_frac(&self, angle: f64, ini_combustion: f64, comb_duration: f64) -> f64;
    /// Heat released [J] while the crank turns from `from` to `to`, both in CA degrees.
    /// Summed over consecutive intervals it never exceeds `efficiency * total_heat`.
    fn heat_released(
        &self,
        from: f64,
        to: f64,
        ini_combustion: f64,
        comb_duration: f64,
        total_heat: f64,
        efficiency: f64,
    ) -> f64 {
        let burned = self.burned_mass_frac(to, ini_combustion, comb_duration)
            - self.burned_mass_frac(from, ini_combustion, comb_duration);
        efficiency * total_heat * burned.max(0.0)
    }
}

dyn_clone::clone_trait_object!(Combustion);

/// Which heat release model the cylinders use.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CombustionKind {
    Wiebe,
    /// No heat release; the engine is motored
    Motoring,
}

impl Default for CombustionKind {
    fn default() -> Self {
        CombustionKind::Wiebe
    }
}

/// Wiebe S-curve: `mfb(x) = 1 - exp(-a*x^n)`.
///
/// `mfb(1) = 1 - exp(-a)` is slightly below one (≈ 0.9933 for `a = 5`): the tail of the
/// charge is left unburned on purpose.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct WiebeFunction {
    a: f64,
    n: f64,
}

impl WiebeFunction {
    pub fn new(a: f64, n: f64) -> Result<WiebeFunction, ConfigError> {
        if !(a > 0.0) || !a.is_finite() {
            return Err(ConfigError::Combustion(format!("Wiebe `a` must be positive: {}", a)));
        }
        if !(n >= 1.0) || !n.is_finite() {
            return Err(ConfigError::Combustion(format!("Wiebe `n` must be at least one: {}", n)));
        }
        Ok(WiebeFunction { a, n })
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn n(&self) -> f64 {
        self.n
    }

    /// Mass fraction burned at normalized angle `x`
    pub fn burned_mass_frac(&self, x: f64) -> f64 {
        1.0 - (-self.a * x.powf(self.n)).exp()
    }

    /// `d(mfb)/dx = a*n*x^(n-1)*exp(-a*x^n)`
    pub fn derivative_burned_mass_frac(&self, x: f64) -> f64 {
        self.a * self.n * x.powf(self.n - 1.0) * (-self.a * x.powf(self.n)).exp()
    }

    /// Heat release rate [J/CA-deg] at `theta`, for a window starting at `theta_start`
    /// and lasting `duration` degrees. Zero outside the window and exactly at its ends.
    pub fn heat_release_rate(
        &self,
        theta: f64,
        theta_start: f64,
        duration: f64,
        total_heat: f64,
        efficiency: f64,
    ) -> f64 {
        if !(duration > 0.0) || theta < theta_start || theta > theta_start + duration {
            return 0.0;
        }
        let x = (theta - theta_start) / duration;
        if x > 0.0 && x < 1.0 {
            efficiency * total_heat * self.derivative_burned_mass_frac(x) / duration
        } else {
            0.0
        }
    }
}

impl Default for WiebeFunction {
    fn default() -> Self {
        WiebeFunction {
            a: WIEBE_A,
            n: WIEBE_N,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WiebeCombustion {
    model_name: String,
    wiebe_function: WiebeFunction,
}

impl WiebeCombustion {
    pub fn new(wiebe: WiebeFunction) -> WiebeCombustion {
        WiebeCombustion {
            model_name: "Wiebe heat release".to_string(),
            wiebe_function: wiebe,
        }
    }

    pub fn wiebe(&self) -> &WiebeFunction {
        &self.wiebe_function
    }
}

impl Combustion for WiebeCombustion {
    fn model_name(&self) -> &str {
        &self.model_name
    }
    fn get_heat_release_rate(
        &self,
        angle: f64,
        ini_combustion: f64,
        comb_duration: f64,
        total_heat: f64,
        efficiency: f64,
    ) -> f64 {
        self.wiebe_function
            .heat_release_rate(angle, ini_combustion, comb_duration, total_heat, efficiency)
    }
    fn burned_mass_frac(&self, angle: f64, ini_combustion: f64, comb_duration: f64) -> f64 {
        if angle <= ini_combustion || !(comb_duration > 0.0) {
            return 0.0;
        }
        let x = ((angle - ini_combustion) / comb_duration).min(1.0);
        self.wiebe_function.burned_mass_frac(x)
    }
}

#[derive(Debug, Clone)]
pub struct NoCombustion {
    model_name: String,
}

impl NoCombustion {
    pub fn new() -> NoCombustion {
        NoCombustion {
            model_name: "no combustion model".to_string(),
        }
    }
}

impl Default for NoCombustion {
    fn default() -> Self {
        NoCombustion::new()
    }
}

impl Combustion for NoCombustion {
    fn model_name(&self) -> &str {
        &self.model_name
    }
    fn get_heat_release_rate(&self, _: f64, _: f64, _: f64, _: f64, _: f64) -> f64 {
        0.0
    }
    fn burned_mass_frac(&self, _: f64, _: f64, _: f64) -> f64 {
        0.0
    }
}

/// Builds the boxed model for `kind`.
pub fn build_combustion(kind: CombustionKind, wiebe: WiebeFunction) -> Box<dyn Combustion> {
    match kind {
        CombustionKind::Wiebe => Box::new(WiebeCombustion::new(wiebe)),
        CombustionKind::Motoring => Box::new(NoCombustion::new()),
    }
}
