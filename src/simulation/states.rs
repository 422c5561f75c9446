//! Core state types for the three-body simulation.
//!
//! The whole system lives in one fixed 12-component vector:
//! - indices 0..6  hold positions  (x1, y1, x2, y2, x3, y3)
//! - indices 6..12 hold velocities (vx1, vy1, vx2, vy2, vx3, vy3)
//!
//! Masses travel next to the state in [`Masses`] and never change while
//! integrating.

use nalgebra::{SVector, Vector2};

use super::error::SimError;

pub type NVec2 = Vector2<f64>;

/// Number of bodies in the system
pub const N_BODIES: usize = 3;

/// Length of the flattened state vector
pub const STATE_DIM: usize = 4 * N_BODIES;

/// Offset of the first velocity component
const VEL_OFFSET: usize = 2 * N_BODIES;

pub type StateVector = SVector<f64, STATE_DIM>;

/// d(state)/dt, laid out exactly like [`SystemState`]
pub type Derivative = StateVector;

/// A single body as entered by the user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub x: NVec2, // position
    pub v: NVec2, // velocity
    pub m: f64, // mass
}

impl Body {
    pub fn new(x: NVec2, v: NVec2, m: f64) -> Self {
        Self { x, v, m }
    }
}

/// Positions and velocities of all three bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemState {
    pub y: StateVector,
}

impl SystemState {
    pub fn from_vector(y: StateVector) -> Self {
        Self { y }
    }

    pub fn from_slice(values: &[f64; STATE_DIM]) -> Self {
        Self { y: StateVector::from_column_slice(values) }
    }

    /// Build the state from per-body positions and velocities
    pub fn from_parts(x: [NVec2; N_BODIES], v: [NVec2; N_BODIES]) -> Self {
        let mut state = Self { y: StateVector::zeros() };
        for i in 0..N_BODIES {
            state.set_position(i, x[i]);
            state.set_velocity(i, v[i]);
        }
        state
    }

    /// Split a set of bodies into the state vector and the mass tuple
    pub fn from_bodies(bodies: &[Body; N_BODIES]) -> (Self, Masses) {
        let bodies = *bodies;
        let x = bodies.map(|b| b.x);
        let v = bodies.map(|b| b.v);
        let masses = Masses(bodies.map(|b| b.m));
        (Self::from_parts(x, v), masses)
    }

    /// Recombine state and masses into bodies
    pub fn bodies(&self, masses: &Masses) -> [Body; N_BODIES] {
        std::array::from_fn(|i| Body::new(self.position(i), self.velocity(i), masses.0[i]))
    }

    pub fn position(&self, i: usize) -> NVec2 {
        NVec2::new(self.y[2 * i], self.y[2 * i + 1])
    }

    pub fn velocity(&self, i: usize) -> NVec2 {
        NVec2::new(self.y[VEL_OFFSET + 2 * i], self.y[VEL_OFFSET + 2 * i + 1])
    }

    pub fn set_position(&mut self, i: usize, x: NVec2) {
        self.y[2 * i] = x.x;
        self.y[2 * i + 1] = x.y;
    }

    pub fn set_velocity(&mut self, i: usize, v: NVec2) {
        self.y[VEL_OFFSET + 2 * i] = v.x;
        self.y[VEL_OFFSET + 2 * i + 1] = v.y;
    }

    pub fn positions(&self) -> [NVec2; N_BODIES] {
        std::array::from_fn(|i| self.position(i))
    }

    pub fn velocities(&self) -> [NVec2; N_BODIES] {
        std::array::from_fn(|i| self.velocity(i))
    }

    pub fn is_finite(&self) -> bool {
        self.y.iter().all(|c| c.is_finite())
    }
}

/// Fixed masses of the three bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Masses(pub [f64; N_BODIES]);

impl Masses {
    pub fn new(m1: f64, m2: f64, m3: f64) -> Self {
        Self([m1, m2, m3])
    }

    pub fn get(&self, i: usize) -> f64 {
        self.0[i]
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Masses must be finite and non-negative. Zero is allowed and turns a
    /// body into a test particle.
    pub fn validate(&self) -> Result<(), SimError> {
        for (i, &m) in self.0.iter().enumerate() {
            if !m.is_finite() || m < 0.0 {
                return Err(SimError::InvalidInput(format!(
                    "mass of body {} must be finite and non-negative, got {}",
                    i + 1,
                    m
                )));
            }
        }
        Ok(())
    }
}

impl Default for Masses {
    fn default() -> Self {
        Self([1.0; N_BODIES])
    }
}
