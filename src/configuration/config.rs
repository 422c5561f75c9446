//! Configuration types for loading three-body scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`ParametersConfig`] – time span, output cadence, tolerances and physical constants
//! - [`IntegratorConfig`] – step-size controller settings
//! - [`BodyConfig`]       – initial state for each of the three bodies
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! Every field has a default, so `{}` is the default scenario:
//! two unit masses at (±1, 0) moving in opposite directions around a third
//! unit mass resting at the origin, integrated for 10 seconds.
//!
//! # YAML format
//!
//! ```yaml
//! parameters:
//!   t_start: 0.0
//!   t_end: 10.0             # end of the simulated span
//!   saveat: 0.01            # output cadence
//!   atol: 1.0e-9            # absolute error tolerance
//!   rtol: 1.0e-6            # relative error tolerance
//!   eps: 1.0e-10            # softening added to the separation
//!   G: 6.6743e-11           # gravitational constant
//!
//! integrator:
//!   h0: ~                   # initial step, ~ picks one automatically
//!   h_min: 0.0
//!   max_step: ~
//!   max_steps: 1000000
//!   safety: 0.9
//!   min_factor: 0.2
//!   max_factor: 10.0
//!   beta: 0.04              # 0 turns the PI controller into a plain I controller
//!
//! bodies:
//!   - x: [  1.0, 0.0 ]
//!     v: [  0.0, 1.0 ]
//!     m: 1.0
//!   - x: [ -1.0, 0.0 ]
//!     v: [  0.0, -1.0 ]
//!     m: 1.0
//!   - x: [  0.0, 0.0 ]
//!     v: [  0.0, 0.0 ]
//!     m: 1.0
//! ```

use serde::Deserialize;

use crate::simulation::forces::{GRAVITATIONAL_CONSTANT, SOFTENING};
use crate::simulation::integrator::{IntegratorOptions, StepController, Tolerance};

/// Global numerical and physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ParametersConfig {
    pub t_start: f64, // time start
    pub t_end: f64, // time end
    pub saveat: f64, // output cadence
    pub atol: f64, // absolute error tolerance
    pub rtol: f64, // relative error tolerance
    pub eps: f64, // softening - keeps the force finite at zero separation
    pub G: f64, // gravitational constant
}

impl Default for ParametersConfig {
    fn default() -> Self {
        let tol = Tolerance::default();
        Self {
            t_start: 0.0,
            t_end: 10.0,
            saveat: 0.01,
            atol: tol.atol,
            rtol: tol.rtol,
            eps: SOFTENING,
            G: GRAVITATIONAL_CONSTANT,
        }
    }
}

/// Step-size control settings
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IntegratorConfig {
    pub h0: Option<f64>, // initial step, None = automatic
    pub h_min: f64, // absolute step floor
    pub max_step: Option<f64>, // largest allowed step
    pub max_steps: u64, // step attempts before giving up
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,
    pub beta: f64, // PI controller memory exponent
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        let options = IntegratorOptions::default();
        let controller = StepController::default();
        Self {
            h0: options.h0,
            h_min: options.h_min,
            max_step: options.max_step,
            max_steps: options.max_steps,
            safety: controller.safety,
            min_factor: controller.min_factor,
            max_factor: controller.max_factor,
            beta: controller.beta,
        }
    }
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    pub x: [f64; 2], // initial position
    pub v: [f64; 2], // initial velocity
    #[serde(default = "default_mass")]
    pub m: f64, // mass
}

fn default_mass() -> f64 {
    1.0
}

/// Default initial conditions
pub fn default_bodies() -> Vec<BodyConfig> {
    vec![
        BodyConfig { x: [1.0, 0.0], v: [0.0, 1.0], m: 1.0 },
        BodyConfig { x: [-1.0, 0.0], v: [0.0, -1.0], m: 1.0 },
        BodyConfig { x: [0.0, 0.0], v: [0.0, 0.0], m: 1.0 },
    ]
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub parameters: ParametersConfig, // global numerical and physical parameters
    #[serde(default)]
    pub integrator: IntegratorConfig, // step-size control
    #[serde(default = "default_bodies")]
    pub bodies: Vec<BodyConfig>, // initial state, exactly three entries
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            parameters: ParametersConfig::default(),
            integrator: IntegratorConfig::default(),
            bodies: default_bodies(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }
}
