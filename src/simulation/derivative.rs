//! Right-hand side of the equations of motion.

use crate::simulation::forces::{Acceleration, NewtonianGravity};
use crate::simulation::states::{Derivative, Masses, NVec2, SystemState, N_BODIES, STATE_DIM};

/// d(state)/dt for the given force law.
///
/// Position slots receive the body's velocity, velocity slots receive the
/// summed acceleration from the other two bodies.
pub fn derivative_with<F>(force: &F, state: &SystemState, masses: &Masses) -> Derivative
where
    F: Acceleration + ?Sized,
{
    let mut dy = Derivative::zeros();
    let x = state.positions();

    for i in 0..N_BODIES {
        let v = state.velocity(i);
        dy[2 * i] = v.x;
        dy[2 * i + 1] = v.y;

        let a = (0..N_BODIES)
            .filter(|&j| j != i)
            .fold(NVec2::zeros(), |acc, j| {
                acc + force.acceleration(x[i], x[j], masses.get(j))
            });
        dy[STATE_DIM / 2 + 2 * i] = a.x;
        dy[STATE_DIM / 2 + 2 * i + 1] = a.y;
    }

    dy
}

/// d(state)/dt under default Newtonian gravity
pub fn derivative(state: &SystemState, masses: &Masses) -> Derivative {
    derivative_with(&NewtonianGravity::default(), state, masses)
}
