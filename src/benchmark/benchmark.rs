use std::time::Instant;

use crate::simulation::diagnostics::conservation;
use crate::simulation::forces::NewtonianGravity;
use crate::simulation::integrator::{Integrator, IntegratorOptions, Tolerance};
use crate::simulation::states::{Masses, NVec2, SystemState};

/// Chenciner–Montgomery figure-eight choreography (G = 1, unit masses)
pub fn figure_eight() -> (SystemState, Masses) {
    let x1 = NVec2::new(0.97000436, -0.24308753);
    let v3 = NVec2::new(-0.93240737, -0.86473146);
    let state = SystemState::from_parts([x1, -x1, NVec2::zeros()], [-v3 / 2.0, -v3 / 2.0, v3]);
    (state, Masses::default())
}

/// Period of the figure-eight orbit
pub const FIGURE_EIGHT_PERIOD: f64 = 6.32591398;

/// Time the integrator on the figure-eight orbit across tolerances
/// Paste output directly into a spreadsheet to graph cost against accuracy
pub fn bench_integrate() {
    let (state0, masses) = figure_eight();
    let gravity = NewtonianGravity::new(1.0, 1e-10);
    let t_end = 10.0 * FIGURE_EIGHT_PERIOD;

    println!("rtol,ms,accepted,rejected,fn_evals,energy_drift");

    for exp in 4..=12 {
        let tol = 10f64.powi(-exp);
        let options = IntegratorOptions::with_tol(Tolerance::new(tol * 1e-3, tol));
        let mut integrator = Integrator::new(gravity, options);

        // Warm up
        if integrator.integrate(&state0, &masses, 0.0, 1.0, 0.1).is_err() {
            println!("{:e},failed,,,,", tol);
            continue;
        }

        let t0 = Instant::now();
        let result = integrator.integrate(&state0, &masses, 0.0, t_end, 0.01);
        let ms = t0.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(trajectory) => {
                let drift = conservation(&trajectory, &masses, &gravity);
                let stats = integrator.stats;
                println!(
                    "{:e},{:.3},{},{},{},{:e}",
                    tol, ms, stats.accepted_steps, stats.rejected_steps, stats.fn_evals, drift.energy_drift
                );
            }
            Err(e) => println!("{:e},failed: {},,,,", tol, e),
        }
    }
}
