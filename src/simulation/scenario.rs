//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a validated runtime
//! bundle containing:
//! - numerical parameters (`Parameters`)
//! - integrator settings (`IntegratorOptions`)
//! - initial state and masses (`SystemState`, `Masses`)
//!
//! A `Scenario` is built once and can be run any number of times; every run
//! starts from the same initial state.

use log::info;

use crate::configuration::config::{BodyConfig, ScenarioConfig};
use crate::simulation::error::SimError;
use crate::simulation::forces::NewtonianGravity;
use crate::simulation::integrator::{Integrator, IntegratorOptions, Stats, StepController};
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, Masses, NVec2, SystemState, N_BODIES};
use crate::simulation::trajectory::Trajectory;

/// A fully-initialized three-body run
///
/// This is the main "runtime bundle" constructed from a [`ScenarioConfig`]:
/// it contains the parameters, integrator settings and the initial state
#[derive(Debug, Clone)]
pub struct Scenario {
    pub parameters: Parameters,
    pub options: IntegratorOptions,
    pub state0: SystemState,
    pub masses: Masses,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, SimError> {
        // Bodies: map `BodyConfig` -> runtime `Body` using nalgebra vectors
        let bodies: [Body; N_BODIES] = cfg
            .bodies
            .iter()
            .map(|bc: &BodyConfig| Body {
                x: NVec2::new(bc.x[0], bc.x[1]),
                v: NVec2::new(bc.v[0], bc.v[1]),
                m: bc.m,
            })
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|bodies: Vec<Body>| {
                SimError::InvalidInput(format!(
                    "expected exactly {} bodies, got {}",
                    N_BODIES,
                    bodies.len()
                ))
            })?;
        let (state0, masses) = SystemState::from_bodies(&bodies);

        // Parameters (runtime) from ParametersConfig
        let p_cfg = cfg.parameters;
        let parameters = Parameters {
            t_start: p_cfg.t_start,
            t_end: p_cfg.t_end,
            saveat: p_cfg.saveat,
            atol: p_cfg.atol,
            rtol: p_cfg.rtol,
            eps: p_cfg.eps,
            G: p_cfg.G,
        };

        // Integrator settings from IntegratorConfig
        let i_cfg = cfg.integrator;
        let options = IntegratorOptions {
            tol: parameters.tolerance(),
            h0: i_cfg.h0,
            h_min: i_cfg.h_min,
            max_step: i_cfg.max_step,
            max_steps: i_cfg.max_steps,
            controller: StepController::new(i_cfg.safety, i_cfg.min_factor, i_cfg.max_factor, i_cfg.beta),
        };

        let scenario = Self {
            parameters,
            options,
            state0,
            masses,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Everything `integrate` would reject, checked up front
    pub fn validate(&self) -> Result<(), SimError> {
        self.parameters.validate()?;
        self.options.validate()?;
        self.masses.validate()?;
        if !self.state0.is_finite() {
            return Err(SimError::InvalidInput("initial state is not finite".to_string()));
        }
        crate::simulation::trajectory::sample_times(
            self.parameters.t_start,
            self.parameters.t_end,
            self.parameters.saveat,
        )?;
        Ok(())
    }

    pub fn gravity(&self) -> NewtonianGravity {
        self.parameters.gravity()
    }

    pub fn integrator(&self) -> Integrator<NewtonianGravity> {
        Integrator::new(self.gravity(), self.options)
    }

    /// Integrate the whole span, returning the samples and step counters
    pub fn run(&self) -> Result<(Trajectory, Stats), SimError> {
        let mut integrator = self.integrator();
        let trajectory = integrator.integrate(
            &self.state0,
            &self.masses,
            self.parameters.t_start,
            self.parameters.t_end,
            self.parameters.saveat,
        )?;
        info!(
            "integrated {} samples ({} accepted / {} rejected steps, {} derivative evaluations)",
            trajectory.len(),
            integrator.stats.accepted_steps,
            integrator.stats.rejected_steps,
            integrator.stats.fn_evals
        );
        Ok((trajectory, integrator.stats))
    }
}
