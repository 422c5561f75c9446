//! Error type for scenario setup and integration.

use std::fmt;

use super::states::SystemState;
use super::trajectory::Trajectory;

#[derive(Debug, Clone)]
pub enum SimError {
    /// Rejected before integration started.
    InvalidInput(String),
    /// Step size collapsed below the floor, or the step budget ran out,
    /// while the error estimate was still above tolerance.
    NonConvergence {
        t: f64,
        step_size: f64,
        state: SystemState,
        /// Samples recorded before the failure. Diagnostics only, not a
        /// complete simulation.
        partial: Trajectory,
    },
    /// The derivative at the starting point is not finite.
    NumericOverflow { t: f64, state: SystemState },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            SimError::NonConvergence { t, step_size, partial, .. } => write!(
                f,
                "Integration did not converge at t = {} (step size {:e}, {} samples recorded)",
                t,
                step_size,
                partial.len()
            ),
            SimError::NumericOverflow { t, .. } => {
                write!(f, "Non-finite derivative at t = {}", t)
            }
        }
    }
}

impl std::error::Error for SimError {}
