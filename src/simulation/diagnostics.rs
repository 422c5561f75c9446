//! Conserved quantities used to judge integration quality.
//!
//! The exact system conserves total energy and angular momentum, so their
//! drift over a trajectory is a direct measure of accumulated error.

use crate::simulation::forces::NewtonianGravity;
use crate::simulation::states::{Masses, NVec2, SystemState, N_BODIES};
use crate::simulation::trajectory::Trajectory;

/// Sum of 1/2 m v^2
pub fn kinetic_energy(state: &SystemState, masses: &Masses) -> f64 {
    (0..N_BODIES)
        .map(|i| 0.5 * masses.get(i) * state.velocity(i).norm_squared())
        .sum()
}

/// Pairwise -G m_i m_j (r + eps/2) / (r + eps)^2.
///
/// This is the exact potential of the softened pair force
/// `G m_j r_vec / (r + eps)^3`, so total energy is an invariant of the
/// integrated system and not only of the unsoftened one.
pub fn potential_energy(state: &SystemState, masses: &Masses, gravity: &NewtonianGravity) -> f64 {
    let mut pe = 0.0;
    for i in 0..N_BODIES {
        for j in (i + 1)..N_BODIES {
            let r = (state.position(j) - state.position(i)).norm();
            let d = r + gravity.eps;
            pe -= gravity.G * masses.get(i) * masses.get(j) * (r + 0.5 * gravity.eps) / (d * d);
        }
    }
    pe
}

pub fn total_energy(state: &SystemState, masses: &Masses, gravity: &NewtonianGravity) -> f64 {
    kinetic_energy(state, masses) + potential_energy(state, masses, gravity)
}

/// z-component of sum m (x cross v)
pub fn angular_momentum(state: &SystemState, masses: &Masses) -> f64 {
    (0..N_BODIES)
        .map(|i| {
            let x = state.position(i);
            let v = state.velocity(i);
            masses.get(i) * (x.x * v.y - x.y * v.x)
        })
        .sum()
}

/// Mass-weighted mean position; `None` if every mass is zero
pub fn center_of_mass(state: &SystemState, masses: &Masses) -> Option<NVec2> {
    let total = masses.total();
    if total <= 0.0 {
        return None;
    }
    let weighted = (0..N_BODIES).fold(NVec2::zeros(), |acc, i| acc + state.position(i) * masses.get(i));
    Some(weighted / total)
}

/// Worst drift of the invariants over a trajectory, relative to the first sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conservation {
    pub energy_drift: f64,
    pub angular_momentum_drift: f64,
}

/// Largest relative change of energy and angular momentum across `trajectory`.
///
/// A quantity whose initial value is zero is compared in absolute terms.
pub fn conservation(trajectory: &Trajectory, masses: &Masses, gravity: &NewtonianGravity) -> Conservation {
    let Some(first) = trajectory.first() else {
        return Conservation {
            energy_drift: 0.0,
            angular_momentum_drift: 0.0,
        };
    };

    let e0 = total_energy(&first.state, masses, gravity);
    let l0 = angular_momentum(&first.state, masses);

    let relative = |value: f64, reference: f64| {
        if reference == 0.0 {
            value.abs()
        } else {
            ((value - reference) / reference).abs()
        }
    };

    trajectory.iter().fold(
        Conservation {
            energy_drift: 0.0,
            angular_momentum_drift: 0.0,
        },
        |acc, s| Conservation {
            energy_drift: acc
                .energy_drift
                .max(relative(total_energy(&s.state, masses, gravity), e0)),
            angular_momentum_drift: acc
                .angular_momentum_drift
                .max(relative(angular_momentum(&s.state, masses), l0)),
        },
    )
}
