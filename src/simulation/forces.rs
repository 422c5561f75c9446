//! Force / acceleration contributors for the three-body engine
//!
//! Defines the pairwise [`Acceleration`] trait and softened Newtonian
//! gravity, the only force acting on the bodies

use crate::simulation::states::NVec2;

/// Gravitational constant (SI value, no unit system is assumed elsewhere)
pub const GRAVITATIONAL_CONSTANT: f64 = 6.67430e-11;

/// Softening added to the separation before cubing
pub const SOFTENING: f64 = 1e-10;

/// Trait for pairwise acceleration laws
/// Implementations return the acceleration felt by a body at `xa`
/// due to a body of mass `mb` at `xb`
pub trait Acceleration {
    fn acceleration(&self, xa: NVec2, xb: NVec2, mb: f64) -> NVec2;
}

/// 2D Newtonian gravity with softening
/// `eps` is added to the separation |r| (not to |r|^2) so that coincident
/// bodies still produce a finite acceleration
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonianGravity {
    pub G: f64, // gravitational constant
    pub eps: f64, // softening
}

impl NewtonianGravity {
    #[allow(non_snake_case)]
    pub fn new(G: f64, eps: f64) -> Self {
        Self { G, eps }
    }
}

impl Default for NewtonianGravity {
    fn default() -> Self {
        Self {
            G: GRAVITATIONAL_CONSTANT,
            eps: SOFTENING,
        }
    }
}

impl Acceleration for NewtonianGravity {
    fn acceleration(&self, xa: NVec2, xb: NVec2, mb: f64) -> NVec2 {
        // r is the displacement vector from a to b,
        // a is pulled along +r
        let r = xb - xa;

        // Softened separation |r| + eps
        let d = r.norm() + self.eps;

        // a = G * m_b * r / (|r| + eps)^3
        // At zero separation r is the zero vector, so the result is zero
        // rather than NaN
        let coef = self.G * mb / (d * d * d);
        coef * r
    }
}

/// Acceleration on the body at `position_a` due to a body of mass `mass_b`
/// at `position_b`, using the default constant and softening
pub fn acceleration(position_a: NVec2, position_b: NVec2, mass_b: f64) -> NVec2 {
    NewtonianGravity::default().acceleration(position_a, position_b, mass_b)
}
