//! Numerical and physical parameters for a run
//!
//! `Parameters` holds runtime settings:
//! - time span and output cadence,
//! - error tolerances for the adaptive integrator,
//! - softening and gravitational constant (`eps`, `G`)

use super::error::SimError;
use super::forces::NewtonianGravity;
use super::integrator::Tolerance;

#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub t_start: f64, // time start
    pub t_end: f64, // time end
    pub saveat: f64, // output cadence
    pub atol: f64, // absolute error tolerance
    pub rtol: f64, // relative error tolerance
    pub eps: f64, // softening
    pub G: f64, // gravitational constant
}

impl Parameters {
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.atol, self.rtol)
    }

    pub fn gravity(&self) -> NewtonianGravity {
        NewtonianGravity::new(self.G, self.eps)
    }

    /// Physical constants must be usable before the integrator sees them;
    /// the time span and tolerances are checked by the integrator itself
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.G.is_finite() || self.G < 0.0 {
            return Err(SimError::InvalidInput(format!(
                "G must be finite and non-negative, got {}",
                self.G
            )));
        }
        if !self.eps.is_finite() || self.eps < 0.0 {
            return Err(SimError::InvalidInput(format!(
                "softening must be finite and non-negative, got {}",
                self.eps
            )));
        }
        Ok(())
    }
}
