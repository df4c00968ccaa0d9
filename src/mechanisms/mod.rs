//! Density mechanisms (membrane currents per unit area) that can be inserted
//! into a section, currently the squid axon Hodgkin Huxley channels (`hh`)
//! and a passive leak (`pas`)
//!
//! Currents are in mA/cm², conductances in S/cm² and voltages in mV, every
//! segment of a section carries its own copy of each mechanism

use std::fmt::Debug;
pub use mechanism_traits::MechanismBase;
use crate::error::BiophysicsError;


/// Membrane current and its slope with respect to voltage,
/// usually implemented with `#[derive(MechanismBase)]`
pub trait MechanismOutput {
    /// Current density from the last call to `update_current` (mA/cm²)
    fn get_current(&self) -> f64;
    /// Derivative of the current with respect to voltage with
    /// gating states held fixed (S/cm²)
    fn get_conductance(&self) -> f64;
}

/// A membrane mechanism applied uniformly across a section
pub trait DensityMechanism: MechanismOutput + Debug + Send + Sync {
    /// Name the mechanism is inserted under
    fn name(&self) -> &'static str;
    /// Sets any state variables to their steady state at the given voltage
    fn initialize(&mut self, voltage: f64);
    /// Calculates current and conductance at the given voltage
    fn update_current(&mut self, voltage: f64);
    /// Advances state variables by `dt` (ms) at the given voltage
    fn update_states(&mut self, voltage: f64, dt: f64);
    /// Checks that parameters are usable
    fn validate(&self) -> Result<(), BiophysicsError> {
        Ok(())
    }
    /// Returns a boxed clone of the mechanism
    fn clone_box(&self) -> Box<dyn DensityMechanism>;
}

impl Clone for Box<dyn DensityMechanism> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

fn is_valid_conductance(g: f64) -> bool {
    g.is_finite() && g >= 0.
}

/// A gating variable with first order kinetics given by
/// opening (`alpha`) and closing (`beta`) rates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicGatingVariable {
    /// Opening rate (1/ms)
    pub alpha: f64,
    /// Closing rate (1/ms)
    pub beta: f64,
    /// Fraction of open gates
    pub state: f64,
}

impl Default for BasicGatingVariable {
    fn default() -> Self {
        BasicGatingVariable {
            alpha: 0.,
            beta: 0.,
            state: 0.,
        }
    }
}

impl BasicGatingVariable {
    /// Steady state of the gate given the current rates
    pub fn steady_state(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Time constant of the gate given the current rates (ms)
    pub fn time_constant(&self) -> f64 {
        1. / (self.alpha + self.beta)
    }

    /// Sets the state to the steady state
    pub fn init_state(&mut self) {
        self.state = self.steady_state();
    }

    /// Integrates the state exactly over `dt` assuming the rates
    /// stay constant during the step
    pub fn update(&mut self, dt: f64) {
        let inf = self.steady_state();
        self.state += (1. - (-dt / self.time_constant()).exp()) * (inf - self.state);
    }
}

// x / (exp(x / y) - 1) with the removable singularity at x = 0 handled
fn vtrap(x: f64, y: f64) -> f64 {
    if (x / y).abs() < 1e-6 {
        y * (1. - x / y / 2.)
    } else {
        x / ((x / y).exp() - 1.)
    }
}

/// Squid axon sodium, potassium and leak channels with the
/// resting potential shifted to -65 mV
#[derive(Debug, Clone, Copy, PartialEq, MechanismBase)]
pub struct HodgkinHuxley {
    /// Maximum sodium conductance (S/cm²)
    pub gnabar: f64,
    /// Maximum potassium conductance (S/cm²)
    pub gkbar: f64,
    /// Leak conductance (S/cm²)
    pub gl: f64,
    /// Leak reversal potential (mV)
    pub el: f64,
    /// Sodium reversal potential (mV)
    pub ena: f64,
    /// Potassium reversal potential (mV)
    pub ek: f64,
    /// Temperature (°C)
    pub celsius: f64,
    /// Sodium activation
    pub m: BasicGatingVariable,
    /// Sodium inactivation
    pub h: BasicGatingVariable,
    /// Potassium activation
    pub n: BasicGatingVariable,
    /// Total current output (mA/cm²)
    pub current: f64,
    /// Total conductance (S/cm²)
    pub conductance: f64,
}

impl Default for HodgkinHuxley {
    fn default() -> Self {
        HodgkinHuxley {
            gnabar: 0.12,
            gkbar: 0.036,
            gl: 0.0003,
            el: -54.3,
            ena: 50.,
            ek: -77.,
            celsius: 6.3,
            m: BasicGatingVariable::default(),
            h: BasicGatingVariable::default(),
            n: BasicGatingVariable::default(),
            current: 0.,
            conductance: 0.,
        }
    }
}

impl HodgkinHuxley {
    /// Temperature scaling of the rates
    pub fn q10(&self) -> f64 {
        3_f64.powf((self.celsius - 6.3) / 10.)
    }

    /// Updates the opening and closing rates of each gate
    pub fn update_rates(&mut self, voltage: f64) {
        let q10 = self.q10();

        self.m.alpha = q10 * 0.1 * vtrap(-(voltage + 40.), 10.);
        self.m.beta = q10 * 4. * (-(voltage + 65.) / 18.).exp();
        self.h.alpha = q10 * 0.07 * (-(voltage + 65.) / 20.).exp();
        self.h.beta = q10 / ((-(voltage + 35.) / 10.).exp() + 1.);
        self.n.alpha = q10 * 0.01 * vtrap(-(voltage + 55.), 10.);
        self.n.beta = q10 * 0.125 * (-(voltage + 65.) / 80.).exp();
    }

    /// Sodium current (mA/cm²)
    pub fn sodium_current(&self, voltage: f64) -> f64 {
        self.gnabar * self.m.state.powi(3) * self.h.state * (voltage - self.ena)
    }

    /// Potassium current (mA/cm²)
    pub fn potassium_current(&self, voltage: f64) -> f64 {
        self.gkbar * self.n.state.powi(4) * (voltage - self.ek)
    }

    /// Leak current (mA/cm²)
    pub fn leak_current(&self, voltage: f64) -> f64 {
        self.gl * (voltage - self.el)
    }
}

impl DensityMechanism for HodgkinHuxley {
    fn name(&self) -> &'static str {
        "hh"
    }

    fn initialize(&mut self, voltage: f64) {
        self.update_rates(voltage);
        self.m.init_state();
        self.h.init_state();
        self.n.init_state();
        self.update_current(voltage);
    }

    fn update_current(&mut self, voltage: f64) {
        self.current = self.sodium_current(voltage)
            + self.potassium_current(voltage)
            + self.leak_current(voltage);
        self.conductance = self.gnabar * self.m.state.powi(3) * self.h.state
            + self.gkbar * self.n.state.powi(4)
            + self.gl;
    }

    fn update_states(&mut self, voltage: f64, dt: f64) {
        self.update_rates(voltage);
        self.m.update(dt);
        self.h.update(dt);
        self.n.update(dt);
    }

    fn validate(&self) -> Result<(), BiophysicsError> {
        let valid = [self.gnabar, self.gkbar, self.gl].iter().all(|g| is_valid_conductance(*g))
            && self.el.is_finite() && self.ena.is_finite() && self.ek.is_finite()
            && self.celsius.is_finite();

        if valid {
            Ok(())
        } else {
            Err(BiophysicsError::InvalidConductance(String::from(self.name())))
        }
    }

    fn clone_box(&self) -> Box<dyn DensityMechanism> {
        Box::new(*self)
    }
}

/// Passive leak current
#[derive(Debug, Clone, Copy, PartialEq, MechanismBase)]
pub struct Passive {
    /// Conductance (S/cm²)
    pub g: f64,
    /// Reversal potential (mV)
    pub e: f64,
    /// Current output (mA/cm²)
    pub current: f64,
    /// Conductance output (S/cm²)
    pub conductance: f64,
}

impl Default for Passive {
    fn default() -> Self {
        Passive {
            g: 0.001,
            e: -70.,
            current: 0.,
            conductance: 0.,
        }
    }
}

impl DensityMechanism for Passive {
    fn name(&self) -> &'static str {
        "pas"
    }

    fn initialize(&mut self, voltage: f64) {
        self.update_current(voltage);
    }

    fn update_current(&mut self, voltage: f64) {
        self.current = self.g * (voltage - self.e);
        self.conductance = self.g;
    }

    fn update_states(&mut self, _voltage: f64, _dt: f64) {}

    fn validate(&self) -> Result<(), BiophysicsError> {
        if is_valid_conductance(self.g) && self.e.is_finite() {
            Ok(())
        } else {
            Err(BiophysicsError::InvalidConductance(String::from(self.name())))
        }
    }

    fn clone_box(&self) -> Box<dyn DensityMechanism> {
        Box::new(*self)
    }
}
