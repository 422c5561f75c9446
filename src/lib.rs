pub mod simulation;
pub mod configuration;
#[cfg(feature = "viewer")]
pub mod visualization;
pub mod benchmark;

pub use simulation::states::{Body, SystemState, Masses, NVec2, StateVector, Derivative, N_BODIES, STATE_DIM};
pub use simulation::forces::{acceleration, Acceleration, NewtonianGravity, GRAVITATIONAL_CONSTANT, SOFTENING};
pub use simulation::derivative::{derivative, derivative_with};
pub use simulation::integrator::{integrate, Integrator, IntegratorOptions, StepController, Stats, Tolerance};
pub use simulation::trajectory::{sample_times, Sample, Trajectory};
pub use simulation::diagnostics::{angular_momentum, center_of_mass, conservation, kinetic_energy, potential_energy, total_energy, Conservation};
pub use simulation::error::SimError;
pub use simulation::params::Parameters;
pub use simulation::scenario::Scenario;

pub use configuration::config::{BodyConfig, IntegratorConfig, ParametersConfig, ScenarioConfig};
pub use configuration::prompt::prompt_scenario;

#[cfg(feature = "viewer")]
pub use visualization::tbsim_vis2d::run_2d;

pub use benchmark::benchmark::bench_integrate;
