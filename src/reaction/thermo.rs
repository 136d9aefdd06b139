//! Closed-system gas transitions of a cylinder charge and per-cycle energy bookkeeping.

use super::gas::{GasState, CV, GAMMA};

/// Volume changes below this are treated as no change [m³]
pub const VOLUME_EPS: f64 = 1e-10;
/// Polytropic exponent of compression/expansion in engines
pub const POLYTROPIC_INDEX: f64 = 1.3;
/// Temperature floor applied after a polytropic step [K]
pub const MIN_TEMPERATURE: f64 = 1.0;

/// How `update_state` moves the gas to its new volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Process {
    /// Adiabatic and reversible: `PV^γ` and `TV^(γ-1)` are conserved
    Isentropic,
    /// `PV^n` with heat exchange, energy closed by the first law
    Polytropic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThermodynamicSystem {
    gas: GasState,
    polytropic_index: f64,
    heat_added: f64, // [J] since last cycle reset
    work_done: f64,  // [J] since last cycle reset
    heat_loss: f64,  // [J] since last cycle reset
}

impl ThermodynamicSystem {
    pub fn new(gas: GasState) -> ThermodynamicSystem {
        ThermodynamicSystem::with_polytropic_index(gas, POLYTROPIC_INDEX)
    }

    pub fn with_polytropic_index(gas: GasState, polytropic_index: f64) -> ThermodynamicSystem {
        ThermodynamicSystem {
            gas,
            polytropic_index,
            heat_added: 0.0,
            work_done: 0.0,
            heat_loss: 0.0,
        }
    }

    /// Moves the gas to `volume` [m³]. `heat_addition` and `heat_loss` [J] are only
    /// used by the polytropic process. Non-positive volumes leave the state untouched.
    pub fn update_state(&mut self, volume: f64, heat_addition: f64, heat_loss: f64, process: Process) {
        match process {
            Process::Isentropic => self.isentropic_process(volume),
            Process::Polytropic => self.polytropic_process(volume, heat_addition, heat_loss),
        }
    }

    fn isentropic_process(&mut self, new_volume: f64) {
        let old_volume = self.gas.volume();
        if !(old_volume > 0.0) || !(new_volume > 0.0) {
            return;
        }
        let ratio = old_volume / new_volume;
        self.gas.set_pressure(self.gas.pressure() * ratio.powf(GAMMA));
        self.gas.set_temperature(self.gas.temperature() * ratio.powf(GAMMA - 1.0));
        self.gas.set_volume(new_volume);
    }

    fn polytropic_process(&mut self, new_volume: f64, heat_addition: f64, heat_loss: f64) {
        let old_volume = self.gas.volume();
        if !(old_volume > 0.0) || !(new_volume > 0.0) {
            return;
        }
        if (new_volume - old_volume).abs() <= VOLUME_EPS {
            return;
        }

        let n = self.polytropic_index;
        let pv = self.gas.pressure() * old_volume;
        let ratio = old_volume / new_volume;
        let work = if (n - 1.0).abs() > 1e-6 {
            (pv - pv * ratio.powf(n - 1.0)) / (n - 1.0)
        } else {
            // isothermal limit
            pv * (new_volume / old_volume).ln()
        };

        let delta_u = heat_addition - heat_loss - work;
        let mass = self.gas.mass();
        let delta_t = if mass > 0.0 { delta_u / (mass * CV) } else { 0.0 };
        let temperature = self.gas.temperature() + delta_t;
        self.gas.set_temperature(temperature.max(MIN_TEMPERATURE));
        self.gas.set_pressure(self.gas.pressure() * ratio.powf(n));
        self.gas.set_volume(new_volume);

        self.work_done += work;
        self.heat_added += heat_addition;
        self.heat_loss += heat_loss;
    }

    /// Replaces the charge with fresh gas at `pressure` and `temperature`, keeping the
    /// current volume. The mass follows from the ideal gas law.
    pub fn recharge(&mut self, pressure: f64, temperature: f64) {
        self.fill(self.gas.volume(), pressure, temperature);
    }

    /// Sets the charge to `pressure` and `temperature` in `volume`, as a cylinder open to a
    /// manifold. No heat or work is booked.
    pub fn fill(&mut self, volume: f64, pressure: f64, temperature: f64) {
        self.gas = GasState::from_ideal_gas(pressure, temperature, volume);
    }

    /// Zeroes the per-cycle energy trackers.
    pub fn reset_cycle(&mut self) {
        self.heat_added = 0.0;
        self.work_done = 0.0;
        self.heat_loss = 0.0;
    }

    pub fn gas(&self) -> &GasState {
        &self.gas
    }
    pub fn polytropic_index(&self) -> f64 {
        self.polytropic_index
    }
    pub fn heat_added(&self) -> f64 {
        self.heat_added
    }
    pub fn work_done(&self) -> f64 {
        self.work_done
    }
    pub fn heat_loss(&self) -> f64 {
        self.heat_loss
    }
}
