use std::f64::consts::PI;
use std::io::Cursor;

use approx::{assert_abs_diff_eq, assert_relative_eq};

use tbsim::benchmark::benchmark::{figure_eight, FIGURE_EIGHT_PERIOD};
use tbsim::configuration::config::default_bodies;
use tbsim::configuration::prompt::{parse_pair, parse_scalar};
use tbsim::simulation::tableau::{A, B, B_HAT, C, E, STAGES};
use tbsim::{
    acceleration, angular_momentum, center_of_mass, conservation, derivative, integrate, prompt_scenario,
    potential_energy, sample_times, total_energy, Acceleration, Integrator, IntegratorOptions, Masses, NVec2, NewtonianGravity,
    Scenario, ScenarioConfig, SimError, StepController, SystemState, Tolerance, Trajectory,
    GRAVITATIONAL_CONSTANT, N_BODIES,
};

/// Default initial conditions: (±1, 0) moving apart along ±y, third body at rest
pub fn default_system() -> (SystemState, Masses) {
    let cfg = ScenarioConfig::default();
    let scenario = Scenario::build_scenario(cfg).expect("default scenario is valid");
    (scenario.state0, scenario.masses)
}

/// Unit-G gravity with the standard softening
pub fn unit_gravity() -> NewtonianGravity {
    NewtonianGravity::new(1.0, 1e-10)
}

pub fn tight_options() -> IntegratorOptions {
    IntegratorOptions::with_tol(Tolerance::new(1e-12, 1e-10))
}

/// Two unit masses at separation `r` with relative speed `v_rel`, plus a
/// massless third body far away. Centre of mass at rest at the origin.
pub fn two_body_system(r: f64, v_rel: f64) -> (SystemState, Masses) {
    let state = SystemState::from_parts(
        [NVec2::new(r / 2.0, 0.0), NVec2::new(-r / 2.0, 0.0), NVec2::new(50.0, 0.0)],
        [NVec2::new(0.0, v_rel / 2.0), NVec2::new(0.0, -v_rel / 2.0), NVec2::zeros()],
    );
    (state, Masses::new(1.0, 1.0, 0.0))
}

fn run(gravity: NewtonianGravity, options: IntegratorOptions, state: &SystemState, masses: &Masses, t_end: f64, saveat: f64) -> Trajectory {
    Integrator::new(gravity, options)
        .integrate(state, masses, 0.0, t_end, saveat)
        .expect("integration succeeds")
}

// ==================================================================================
// State vector tests
// ==================================================================================

#[test]
fn state_layout_positions_then_velocities() {
    let state = SystemState::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);

    assert_eq!(state.position(0), NVec2::new(1.0, 2.0));
    assert_eq!(state.position(2), NVec2::new(5.0, 6.0));
    assert_eq!(state.velocity(0), NVec2::new(7.0, 8.0));
    assert_eq!(state.velocity(2), NVec2::new(11.0, 12.0));
}

#[test]
fn state_bodies_round_trip() {
    let (state, masses) = default_system();
    let bodies = state.bodies(&masses);
    let (state2, masses2) = SystemState::from_bodies(&bodies);

    assert_eq!(state, state2);
    assert_eq!(masses, masses2);
    assert_eq!(bodies[1].x, NVec2::new(-1.0, 0.0));
    assert_eq!(bodies[1].v, NVec2::new(0.0, -1.0));
}

#[test]
fn masses_validation() {
    assert!(Masses::new(1.0, 0.0, 2.0).validate().is_ok());
    assert!(matches!(Masses::new(1.0, -1.0, 1.0).validate(), Err(SimError::InvalidInput(_))));
    assert!(matches!(Masses::new(f64::NAN, 1.0, 1.0).validate(), Err(SimError::InvalidInput(_))));
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let state = SystemState::from_parts(
        [NVec2::new(0.0, 0.0), NVec2::new(1.0, 0.5), NVec2::new(-2.0, 1.0)],
        [NVec2::zeros(); N_BODIES],
    );
    let masses = Masses::new(2.0, 3.0, 0.5);
    let dy = derivative(&state, &masses);

    let net: NVec2 = (0..N_BODIES)
        .map(|i| NVec2::new(dy[6 + 2 * i], dy[6 + 2 * i + 1]) * masses.get(i))
        .sum();

    assert!(net.norm() < 1e-24, "Net force not zero: {:?}", net);
}

#[test]
fn gravity_points_toward_other_body() {
    let g = unit_gravity();
    let xa = NVec2::new(0.0, 0.0);
    let xb = NVec2::new(2.0, 1.0);
    let a = g.acceleration(xa, xb, 1.0);

    assert!(a.dot(&(xb - xa)) > 0.0, "Acceleration is not toward second body");
    assert_abs_diff_eq!(a.perp(&(xb - xa)), 0.0, epsilon = 1e-15);
}

#[test]
fn gravity_inverse_square_law() {
    let g = unit_gravity();
    let a_r = g.acceleration(NVec2::zeros(), NVec2::new(1.0, 0.0), 1.0);
    let a_2r = g.acceleration(NVec2::zeros(), NVec2::new(2.0, 0.0), 1.0);

    let ratio = a_r.norm() / a_2r.norm();
    assert!((ratio - 4.0).abs() < 1e-6, "Expected ~4x, got {}", ratio);
}

#[test]
fn gravity_default_constant() {
    let a = acceleration(NVec2::zeros(), NVec2::new(1.0, 0.0), 1.0);
    assert_relative_eq!(a.x, GRAVITATIONAL_CONSTANT, max_relative = 1e-9);
    assert_eq!(a.y, 0.0);
}

#[test]
fn gravity_softening_prevents_blowup() {
    let g = unit_gravity();

    let coincident = g.acceleration(NVec2::new(0.3, 0.3), NVec2::new(0.3, 0.3), 1.0);
    assert_eq!(coincident, NVec2::zeros());

    let close = g.acceleration(NVec2::zeros(), NVec2::new(1e-15, 0.0), 1.0);
    assert!(close.iter().all(|c| c.is_finite()), "Softening failed: {:?}", close);
}

// ==================================================================================
// Derivative tests
// ==================================================================================

#[test]
fn derivative_position_slots_are_velocities() {
    let (state, masses) = default_system();
    let before = state;
    let dy = derivative(&state, &masses);

    assert_eq!(state, before, "derivative must not mutate its input");
    for i in 0..N_BODIES {
        let v = state.velocity(i);
        assert_eq!(dy[2 * i], v.x);
        assert_eq!(dy[2 * i + 1], v.y);
    }
}

#[test]
fn derivative_velocity_slots_sum_pair_accelerations() {
    let (state, masses) = default_system();
    let dy = derivative(&state, &masses);

    let x = state.positions();
    let expected = acceleration(x[0], x[1], masses.get(1)) + acceleration(x[0], x[2], masses.get(2));
    assert_eq!(dy[6], expected.x);
    assert_eq!(dy[7], expected.y);

    // the resting centre body is pulled equally from both sides
    assert_eq!(dy[10], 0.0);
    assert_eq!(dy[11], 0.0);
}

// ==================================================================================
// Tableau tests
// ==================================================================================

#[test]
fn tableau_rows_sum_to_nodes() {
    for s in 0..STAGES {
        let row: f64 = A[s].iter().sum();
        assert_abs_diff_eq!(row, C[s], epsilon = 1e-14);
    }
}

#[test]
fn tableau_weights_are_consistent() {
    assert_abs_diff_eq!(B.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
    assert_abs_diff_eq!(B_HAT.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
    assert_abs_diff_eq!(E.iter().sum::<f64>(), 0.0, epsilon = 1e-14);
    for s in 0..STAGES {
        assert_eq!(B[s], A[STAGES - 1][s], "first same as last");
        assert_abs_diff_eq!(E[s], B[s] - B_HAT[s], epsilon = 1e-15);
    }
}

// ==================================================================================
// Step controller tests
// ==================================================================================

#[test]
fn controller_i_mode_matches_formula() {
    let mut ctl = StepController::new(0.9, 0.2, 10.0, 0.0);

    assert_relative_eq!(ctl.accept(0.5), 0.9 * 2f64.powf(0.2), max_relative = 1e-12);
    assert_eq!(ctl.accept(0.0), 10.0);
    assert_eq!(ctl.accept(1e-30), 10.0);
    assert_relative_eq!(ctl.reject(32.0), 0.45, max_relative = 1e-12);
    assert_eq!(ctl.reject(1e30), 0.2);
    assert_eq!(ctl.reject(f64::INFINITY), 0.2);
}

#[test]
fn controller_rejection_never_grows() {
    let ctl = StepController::default();
    for err in [1.0000001, 1.5, 10.0, 1e6] {
        assert!(ctl.reject(err) < 1.0, "reject({}) grew the step", err);
    }
}

#[test]
fn controller_settings_validated() {
    assert!(StepController::default().validate().is_ok());
    assert!(StepController::new(1.5, 0.2, 10.0, 0.0).validate().is_err());
    assert!(StepController::new(0.9, 0.0, 10.0, 0.0).validate().is_err());
    assert!(StepController::new(0.9, 0.2, 0.5, 0.0).validate().is_err());
    assert!(StepController::new(0.9, 0.2, 10.0, 0.3).validate().is_err());
}

// ==================================================================================
// Sample grid and trajectory tests
// ==================================================================================

#[test]
fn sample_grid_whole_intervals() {
    let times = sample_times(0.0, 10.0, 0.01).unwrap();

    assert_eq!(times.len(), 1001);
    assert_eq!(times[0], 0.0);
    assert_eq!(*times.last().unwrap(), 10.0);
    for (k, t) in times.iter().enumerate() {
        assert_abs_diff_eq!(*t, k as f64 * 0.01, epsilon = 1e-12);
    }
}

#[test]
fn sample_grid_partial_last_interval() {
    let times = sample_times(0.0, 1.0, 0.3).unwrap();
    assert_eq!(times.len(), 5);
    assert_abs_diff_eq!(times[3], 0.9, epsilon = 1e-15);
    assert_eq!(times[4], 1.0);

    assert_eq!(sample_times(0.0, 0.1, 1.0).unwrap(), vec![0.0, 0.1]);
    assert_eq!(sample_times(5.0, 5.0, 0.01).unwrap(), vec![5.0]);
}

#[test]
fn sample_grid_rejects_bad_input() {
    assert!(matches!(sample_times(1.0, 0.0, 0.1), Err(SimError::InvalidInput(_))));
    assert!(matches!(sample_times(0.0, 1.0, 0.0), Err(SimError::InvalidInput(_))));
    assert!(matches!(sample_times(0.0, 1.0, -0.1), Err(SimError::InvalidInput(_))));
    assert!(matches!(sample_times(0.0, f64::INFINITY, 0.1), Err(SimError::InvalidInput(_))));
}

#[test]
fn sample_grid_rejects_unbounded_sample_counts() {
    assert!(matches!(sample_times(0.0, 10.0, 1e-300), Err(SimError::InvalidInput(_))));
    // the span itself overflows to infinity
    assert!(matches!(sample_times(-1e308, 1e308, 1e307), Err(SimError::InvalidInput(_))));

    let (state, masses) = default_system();
    assert!(matches!(
        integrate(&state, &masses, -1e308, 1e308, 1e307, 1e-9),
        Err(SimError::InvalidInput(_))
    ));
    assert!(matches!(integrate(&state, &masses, 0.0, 10.0, 1e-300, 1e-9), Err(SimError::InvalidInput(_))));
}

#[test]
fn trajectory_exposes_paths_for_rendering() {
    let (state, masses) = default_system();
    let trajectory = integrate(&state, &masses, 0.0, 1.0, 0.1, 1e-9).unwrap();

    assert_eq!(trajectory.len(), 11);
    assert_eq!(trajectory.body_path(0).len(), 11);
    assert_eq!(trajectory.positions_at(0).unwrap(), state.positions());
    assert!(trajectory.positions_at(11).is_none());
    assert_eq!(trajectory.iter().count(), trajectory.times().len());
    assert_eq!(trajectory.final_state(), trajectory.last().map(|s| s.state));
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn integrator_sample_count_and_spacing() {
    let (state, masses) = default_system();
    let trajectory = integrate(&state, &masses, 0.0, 10.0, 0.01, Tolerance::new(1e-12, 1e-10)).unwrap();

    assert_eq!(trajectory.len(), 1001);
    assert_eq!(trajectory.first().unwrap().t, 0.0);
    assert_eq!(trajectory.last().unwrap().t, 10.0);
    for (k, s) in trajectory.iter().enumerate() {
        assert_abs_diff_eq!(s.t, k as f64 * 0.01, epsilon = 1e-12);
    }

    // with G ~ 1e-11 the bodies barely deviate from straight lines
    for s in &trajectory {
        let t = s.t;
        let x = s.state.positions();
        assert!((x[0] - NVec2::new(1.0, t)).norm() < 1e-7, "body 1 off at t = {}", t);
        assert!((x[1] - NVec2::new(-1.0, -t)).norm() < 1e-7, "body 2 off at t = {}", t);
        assert!(x[2].norm() < 1e-7, "body 3 off at t = {}", t);
    }
}

#[test]
fn integrator_degenerate_span() {
    let (state, masses) = default_system();
    let trajectory = integrate(&state, &masses, 5.0, 5.0, 0.01, 1e-9).unwrap();

    assert_eq!(trajectory.len(), 1);
    assert_eq!(trajectory.first().unwrap().t, 5.0);
    assert_eq!(trajectory.first().unwrap().state, state);
}

#[test]
fn integrator_rejects_invalid_input() {
    let (state, masses) = default_system();

    let negative = Masses::new(1.0, -1.0, 1.0);
    assert!(matches!(integrate(&state, &negative, 0.0, 1.0, 0.1, 1e-9), Err(SimError::InvalidInput(_))));

    let mut nan_state = state;
    nan_state.y[3] = f64::NAN;
    assert!(matches!(integrate(&nan_state, &masses, 0.0, 1.0, 0.1, 1e-9), Err(SimError::InvalidInput(_))));

    assert!(matches!(integrate(&state, &masses, 1.0, 0.0, 0.1, 1e-9), Err(SimError::InvalidInput(_))));
    assert!(matches!(integrate(&state, &masses, 0.0, 1.0, 0.0, 1e-9), Err(SimError::InvalidInput(_))));
    assert!(matches!(integrate(&state, &masses, 0.0, 1.0, 0.1, 0.0), Err(SimError::InvalidInput(_))));
}

#[test]
fn potential_matches_softened_force() {
    // large softening so the difference from the plain 1/r potential shows
    let gravity = NewtonianGravity::new(1.0, 0.1);
    let r = 0.7;
    let dr = 1e-5;
    let energy_at = |sep: f64| {
        let (state, masses) = two_body_system(sep, 0.0);
        potential_energy(&state, &masses, &gravity)
    };

    let du_dr = (energy_at(r + dr) - energy_at(r - dr)) / (2.0 * dr);
    let force = gravity.G * r / (r + gravity.eps).powi(3);
    assert_relative_eq!(du_dr, force, max_relative = 1e-6);
    assert!(energy_at(1e9).abs() < 1e-8);
}

#[test]
fn integrator_energy_and_angular_momentum_conserved() {
    let (state, masses) = default_system();
    let gravity = NewtonianGravity::default();
    let trajectory = run(gravity, tight_options(), &state, &masses, 10.0, 0.01);
    let drift = conservation(&trajectory, &masses, &gravity);

    assert!(drift.energy_drift < 1e-2, "Energy drift {}", drift.energy_drift);
    assert!(drift.angular_momentum_drift < 1e-2, "L drift {}", drift.angular_momentum_drift);
    assert_relative_eq!(angular_momentum(&state, &masses), 2.0);
}

#[test]
fn integrator_conserves_invariants_under_strong_gravity() {
    // same layout with G = 1: a bound, strongly interacting system
    let (state, masses) = default_system();
    let gravity = unit_gravity();
    let trajectory = run(gravity, tight_options(), &state, &masses, 10.0, 0.01);
    let drift = conservation(&trajectory, &masses, &gravity);

    assert!(total_energy(&state, &masses, &gravity) < 0.0);
    assert!(drift.energy_drift < 1e-4, "Energy drift {}", drift.energy_drift);
    assert!(drift.angular_momentum_drift < 1e-4, "L drift {}", drift.angular_momentum_drift);
}

#[test]
fn integrator_preserves_mirror_symmetry() {
    let (state, masses) = default_system();
    let trajectory = run(unit_gravity(), tight_options(), &state, &masses, 10.0, 0.01);

    for s in &trajectory {
        let x = s.state.positions();
        let v = s.state.velocities();
        assert!((x[0] + x[1]).norm() < 1e-12, "positions not mirrored at t = {}", s.t);
        assert!((v[0] + v[1]).norm() < 1e-12, "velocities not mirrored at t = {}", s.t);
        assert!(x[2].norm() < 1e-12, "centre body moved at t = {}", s.t);
    }
}

#[test]
fn integrator_two_body_circular_orbit() {
    // r = 1, M = 2, G = 1: omega = sqrt(GM / r^3) = sqrt(2)
    let omega = 2f64.sqrt();
    let (state, masses) = two_body_system(1.0, omega);
    let period = 2.0 * PI / omega;
    let trajectory = run(unit_gravity(), tight_options(), &state, &masses, 2.0 * period, 0.01);

    for s in &trajectory {
        let expected = 0.5 * NVec2::new((omega * s.t).cos(), (omega * s.t).sin());
        let x = s.state.positions();
        assert!((x[0] - expected).norm() < 1e-6, "body 1 off the circle at t = {}", s.t);
        assert!((x[1] + expected).norm() < 1e-6, "body 2 off the circle at t = {}", s.t);
    }
}

#[test]
fn integrator_appends_t_end_after_partial_interval() {
    let omega = 2f64.sqrt();
    let (state, masses) = two_body_system(1.0, omega);
    let trajectory = run(unit_gravity(), tight_options(), &state, &masses, 1.0, 0.3);

    let times = trajectory.times();
    assert_eq!(times.len(), 5);
    for (k, t) in times.iter().take(4).enumerate() {
        assert_abs_diff_eq!(*t, k as f64 * 0.3, epsilon = 1e-12);
    }
    assert_eq!(times[4], 1.0);

    // samples between accepted steps come from the dense output
    for s in &trajectory {
        let expected = 0.5 * NVec2::new((omega * s.t).cos(), (omega * s.t).sin());
        let x = s.state.positions();
        assert!((x[0] - expected).norm() < 1e-6, "body 1 off the circle at t = {}", s.t);
        assert!((x[1] + expected).norm() < 1e-6, "body 2 off the circle at t = {}", s.t);
    }
}

#[test]
fn integrator_honours_requested_start_step() {
    let omega = 2f64.sqrt();
    let (state, masses) = two_body_system(1.0, omega);

    // a tiny request is raised to the step floor instead of failing outright
    for h0 in [1e-20, 1e-3] {
        let mut options = tight_options();
        options.h0 = Some(h0);
        let trajectory = run(unit_gravity(), options, &state, &masses, 1.0, 0.1);

        assert_eq!(trajectory.len(), 11);
        let last = trajectory.last().unwrap();
        let expected = 0.5 * NVec2::new(omega.cos(), omega.sin());
        assert!((last.state.position(0) - expected).norm() < 1e-6, "h0 = {:e}", h0);
    }
}

#[test]
fn integrator_two_body_ellipse_closes() {
    // apoapsis r = 1, v_rel = 1: E = 1/2 - 2 = -3/2, a = GM / (2|E|) = 2/3
    let (state, masses) = two_body_system(1.0, 1.0);
    let a: f64 = 2.0 / 3.0;
    let period = 2.0 * PI * (a.powi(3) / 2.0).sqrt();
    let saveat = period / 100.0;
    let trajectory = run(unit_gravity(), tight_options(), &state, &masses, period, saveat);

    assert_eq!(trajectory.len(), 101);

    let separation = |s: &SystemState| (s.position(0) - s.position(1)).norm();
    let peri = separation(&trajectory.samples()[50].state);
    assert_abs_diff_eq!(peri, 2.0 * a - 1.0, epsilon = 1e-6);

    for s in &trajectory {
        let r = separation(&s.state);
        assert!(r > 2.0 * a - 1.0 - 1e-6 && r < 1.0 + 1e-6, "separation {} outside [q, Q]", r);
        let com = center_of_mass(&s.state, &masses).unwrap();
        assert!(com.norm() < 1e-9, "centre of mass drifted to {:?}", com);
    }

    let last = trajectory.final_state().unwrap();
    for i in 0..2 {
        assert!((last.position(i) - state.position(i)).norm() < 1e-6, "orbit did not close");
        assert!((last.velocity(i) - state.velocity(i)).norm() < 1e-6, "orbit did not close");
    }
}

#[test]
fn integrator_figure_eight_returns() {
    let (state, masses) = figure_eight();
    let trajectory = run(unit_gravity(), tight_options(), &state, &masses, FIGURE_EIGHT_PERIOD, 0.01);
    let last = trajectory.final_state().unwrap();

    for i in 0..N_BODIES {
        assert!(
            (last.position(i) - state.position(i)).norm() < 1e-3,
            "body {} did not return: {:?}",
            i + 1,
            last.position(i)
        );
    }
}

#[test]
fn integrator_pure_i_controller_meets_tolerance() {
    let omega = 2f64.sqrt();
    let (state, masses) = two_body_system(1.0, omega);
    let mut options = tight_options();
    options.controller = StepController::new(0.9, 0.2, 5.0, 0.0);
    let trajectory = run(unit_gravity(), options, &state, &masses, 2.0 * PI / omega, 0.05);

    let last = trajectory.final_state().unwrap();
    assert!((last.position(0) - NVec2::new(0.5, 0.0)).norm() < 1e-6);
}

#[test]
fn integrator_counts_derivative_evaluations() {
    let (state, masses) = figure_eight();
    let mut integrator = Integrator::new(unit_gravity(), tight_options());
    integrator.integrate(&state, &masses, 0.0, 1.0, 0.1).unwrap();

    let stats = integrator.stats;
    assert!(stats.accepted_steps > 0);
    // six fresh stages per attempt, plus f(y0) and the starting-step probe
    assert_eq!(stats.fn_evals, 6 * (stats.accepted_steps + stats.rejected_steps) + 2);
}

#[test]
fn integrator_max_step_is_respected() {
    let (state, masses) = default_system();
    let mut options = IntegratorOptions::with_tol(Tolerance::uniform(1e-6));
    options.max_step = Some(0.5);
    let mut integrator = Integrator::new(NewtonianGravity::default(), options);
    integrator.integrate(&state, &masses, 0.0, 10.0, 1.0).unwrap();

    assert!(integrator.stats.accepted_steps >= 20);
}

#[test]
fn integrator_signals_non_convergence_on_near_collision() {
    let state = SystemState::from_parts(
        [NVec2::new(0.0, 0.0), NVec2::new(1e-9, 0.0), NVec2::new(10.0, 0.0)],
        [NVec2::zeros(); N_BODIES],
    );
    let masses = Masses::default();
    let mut options = tight_options();
    options.max_steps = 20_000;
    let mut integrator = Integrator::new(unit_gravity(), options);

    let result = integrator.integrate(&state, &masses, 0.0, 1.0, 0.1);
    match result {
        Err(SimError::NonConvergence { state, partial, .. }) => {
            assert!(state.is_finite());
            assert!(partial.iter().all(|s| s.state.is_finite()));
            assert!(partial.len() < 11);
        }
        Err(SimError::NumericOverflow { .. }) => {}
        other => panic!("expected a convergence failure, got {:?}", other.map(|t| t.len())),
    }
    let stats = integrator.stats;
    assert!(stats.accepted_steps + stats.rejected_steps <= 20_000);
}

#[test]
fn integrator_signals_non_convergence_with_physical_constant() {
    let state = SystemState::from_parts(
        [NVec2::new(0.0, 0.0), NVec2::new(1e-12, 0.0), NVec2::new(1.0, 0.0)],
        [NVec2::zeros(); N_BODIES],
    );
    let masses = Masses::default();
    let mut options = tight_options();
    options.max_steps = 20_000;

    let result = Integrator::new(NewtonianGravity::default(), options).integrate(&state, &masses, 0.0, 10.0, 0.01);
    assert!(
        matches!(result, Err(SimError::NonConvergence { .. }) | Err(SimError::NumericOverflow { .. })),
        "expected a convergence failure"
    );
}

#[test]
fn integrator_signals_numeric_overflow_at_start() {
    let state = SystemState::from_parts(
        [NVec2::new(0.0, 0.0), NVec2::new(1e-5, 0.0), NVec2::new(1.0, 0.0)],
        [NVec2::zeros(); N_BODIES],
    );
    let masses = Masses::new(f64::MAX, f64::MAX, 1.0);
    let result = Integrator::new(unit_gravity(), tight_options()).integrate(&state, &masses, 0.0, 1.0, 0.1);

    assert!(matches!(result, Err(SimError::NumericOverflow { t, .. }) if t == 0.0));
}

#[test]
fn integrator_runs_independently_in_parallel() {
    let (state, masses) = figure_eight();
    let sequential = run(unit_gravity(), tight_options(), &state, &masses, 1.0, 0.1);

    let results: Vec<Trajectory> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| scope.spawn(|| run(unit_gravity(), tight_options(), &state, &masses, 1.0, 0.1)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for trajectory in results {
        assert_eq!(trajectory, sequential);
    }
}

// ==================================================================================
// Configuration tests
// ==================================================================================

#[test]
fn config_empty_mapping_is_default() {
    let cfg = ScenarioConfig::from_yaml_str("{}").unwrap();
    assert_eq!(cfg, ScenarioConfig::default());
    assert_eq!(cfg.bodies, default_bodies());
    assert_eq!(cfg.parameters.t_end, 10.0);
    assert_eq!(cfg.parameters.G, GRAVITATIONAL_CONSTANT);
}

#[test]
fn config_partial_sections_keep_defaults() {
    let cfg = ScenarioConfig::from_yaml_str("parameters:\n  G: 1.0\n  t_end: 2.5\nintegrator:\n  beta: 0.0\n").unwrap();

    assert_eq!(cfg.parameters.G, 1.0);
    assert_eq!(cfg.parameters.t_end, 2.5);
    assert_eq!(cfg.parameters.saveat, 0.01);
    assert_eq!(cfg.integrator.beta, 0.0);
    assert_eq!(cfg.integrator.safety, 0.9);
}

#[test]
fn config_rejects_unknown_fields() {
    assert!(ScenarioConfig::from_yaml_str("parameters:\n  dt: 0.1\n").is_err());
}

#[test]
fn config_wrong_body_count_is_invalid() {
    let yaml = "bodies:\n  - x: [0.0, 0.0]\n    v: [0.0, 0.0]\n  - x: [1.0, 0.0]\n    v: [0.0, 1.0]\n";
    let cfg = ScenarioConfig::from_yaml_str(yaml).unwrap();
    assert!(matches!(Scenario::build_scenario(cfg), Err(SimError::InvalidInput(_))));
}

#[test]
fn config_bundled_scenarios_load() {
    for yaml in [
        include_str!("../scenarios/default.yaml"),
        include_str!("../scenarios/figure_eight.yaml"),
        include_str!("../scenarios/euler_collinear.yaml"),
    ] {
        let cfg = ScenarioConfig::from_yaml_str(yaml).unwrap();
        assert!(Scenario::build_scenario(cfg).is_ok());
    }
}

#[test]
fn scenario_default_run() {
    let scenario = Scenario::build_scenario(ScenarioConfig::default()).unwrap();
    let (trajectory, stats) = scenario.run().unwrap();

    assert_eq!(trajectory.len(), 1001);
    assert_eq!(trajectory.last().unwrap().t, 10.0);
    assert!(stats.fn_evals > 0);
}

#[test]
fn scenario_figure_eight_from_yaml() {
    let cfg = ScenarioConfig::from_yaml_str(include_str!("../scenarios/figure_eight.yaml")).unwrap();
    let scenario = Scenario::build_scenario(cfg).unwrap();
    let (trajectory, _) = scenario.run().unwrap();

    let last = trajectory.final_state().unwrap();
    for i in 0..N_BODIES {
        assert!((last.position(i) - scenario.state0.position(i)).norm() < 1e-3);
    }
}

// ==================================================================================
// Prompt tests
// ==================================================================================

#[test]
fn prompt_parses_pairs_and_scalars() {
    assert_eq!(parse_pair("1 2"), Some([1.0, 2.0]));
    assert_eq!(parse_pair(" [0.5, -1] \n"), Some([0.5, -1.0]));
    assert_eq!(parse_pair("(3,4)"), Some([3.0, 4.0]));
    assert_eq!(parse_pair("1"), None);
    assert_eq!(parse_pair("1 2 3"), None);
    assert_eq!(parse_pair("a b"), None);
    assert_eq!(parse_pair("inf 0"), None);
    assert_eq!(parse_scalar(" 2.5\n"), Some(2.5));
    assert_eq!(parse_scalar("x"), None);
}

#[test]
fn prompt_blank_answers_keep_defaults() {
    let mut input = Cursor::new("\n".repeat(10));
    let mut output = Vec::new();
    let cfg = prompt_scenario(&mut input, &mut output, ScenarioConfig::default()).unwrap();

    assert_eq!(cfg, ScenarioConfig::default());
    let shown = String::from_utf8(output).unwrap();
    assert!(shown.contains("Body 1 position (x, y) [1, 0]"));
    assert!(shown.contains("Simulation duration in seconds [10]"));
}

#[test]
fn prompt_reads_answers_and_retries_bad_ones() {
    let answers = "2 3\n[0.5, -1]\nabc\n-1\n4\n\n\n\n\n\n\n0\n7.5\n";
    let mut input = Cursor::new(answers);
    let mut output = Vec::new();
    let cfg = prompt_scenario(&mut input, &mut output, ScenarioConfig::default()).unwrap();

    assert_eq!(cfg.bodies[0].x, [2.0, 3.0]);
    assert_eq!(cfg.bodies[0].v, [0.5, -1.0]);
    assert_eq!(cfg.bodies[0].m, 4.0);
    assert_eq!(cfg.bodies[1], default_bodies()[1]);
    assert_eq!(cfg.bodies[2], default_bodies()[2]);
    assert_eq!(cfg.parameters.t_end, 7.5);

    let shown = String::from_utf8(output).unwrap();
    assert_eq!(shown.matches("try again").count(), 3);
}

#[test]
fn prompt_end_of_input_uses_defaults() {
    let mut input = Cursor::new("0 0\n");
    let mut output = Vec::new();
    let cfg = prompt_scenario(&mut input, &mut output, ScenarioConfig::default()).unwrap();

    assert_eq!(cfg.bodies[0].x, [0.0, 0.0]);
    assert_eq!(cfg.bodies[0].v, default_bodies()[0].v);
    assert_eq!(cfg.parameters.t_end, 10.0);
}
