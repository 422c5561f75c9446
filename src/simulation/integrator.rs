//! Adaptive time integrator for the three-body system
//!
//! Embedded Dormand–Prince 5(4) pair with a PI step-size controller and
//! 4th order dense output. The integrator advances the state with whatever
//! step the error estimate allows and fills the [`Trajectory`] at a fixed
//! output cadence by interpolating inside accepted steps.

use log::{debug, trace, warn};

use super::derivative::derivative_with;
use super::error::SimError;
use super::forces::{Acceleration, NewtonianGravity};
use super::states::{Masses, StateVector, SystemState, STATE_DIM};
use super::tableau::{A, D, E, ORDER, STAGES};
use super::trajectory::{sample_times, Trajectory};

/// Error tolerances, combined per component as `atol + rtol * |y|`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub atol: f64, // absolute error tolerance
    pub rtol: f64, // relative error tolerance
}

impl Tolerance {
    pub fn new(atol: f64, rtol: f64) -> Self {
        Self { atol, rtol }
    }

    /// Same value for the absolute and the relative part
    pub fn uniform(tol: f64) -> Self {
        Self { atol: tol, rtol: tol }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !self.atol.is_finite() || self.atol <= 0.0 {
            return Err(SimError::InvalidInput(format!(
                "atol must be positive and finite, got {}",
                self.atol
            )));
        }
        if !self.rtol.is_finite() || self.rtol < 0.0 {
            return Err(SimError::InvalidInput(format!(
                "rtol must be non-negative and finite, got {}",
                self.rtol
            )));
        }
        Ok(())
    }

    fn scale(&self, y: f64, y_new: f64) -> f64 {
        self.atol + self.rtol * y.abs().max(y_new.abs())
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { atol: 1e-9, rtol: 1e-6 }
    }
}

impl From<f64> for Tolerance {
    fn from(tol: f64) -> Self {
        Self::uniform(tol)
    }
}

/// PI step-size controller
///
/// On acceptance `fac = safety * err^(-alpha) * err_prev^beta` with
/// `alpha = 1/5 - 0.75 * beta`; `beta = 0` is the plain I-controller
/// `safety * (1/err)^(1/5)`. The factor is clamped to
/// `[min_factor, max_factor]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepController {
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,
    pub beta: f64,
    err_prev: f64,
}

/// Floor for the remembered error, keeps `err_prev^beta` away from zero
const ERR_PREV_FLOOR: f64 = 1e-4;

impl Default for StepController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 10.0,
            beta: 0.04,
            err_prev: ERR_PREV_FLOOR,
        }
    }
}

impl StepController {
    pub fn new(safety: f64, min_factor: f64, max_factor: f64, beta: f64) -> Self {
        Self {
            safety,
            min_factor,
            max_factor,
            beta,
            err_prev: ERR_PREV_FLOOR,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.safety > 0.0 && self.safety <= 1.0) {
            return Err(SimError::InvalidInput(format!(
                "safety factor must be in (0, 1], got {}",
                self.safety
            )));
        }
        if !(self.min_factor > 0.0 && self.min_factor < 1.0) {
            return Err(SimError::InvalidInput(format!(
                "min_factor must be in (0, 1), got {}",
                self.min_factor
            )));
        }
        if !(self.max_factor > 1.0 && self.max_factor.is_finite()) {
            return Err(SimError::InvalidInput(format!(
                "max_factor must be finite and greater than 1, got {}",
                self.max_factor
            )));
        }
        if !(self.beta >= 0.0 && self.beta < 0.2) {
            return Err(SimError::InvalidInput(format!(
                "beta must be in [0, 0.2), got {}",
                self.beta
            )));
        }
        Ok(())
    }

    /// Forget the error history, used at the start of every run
    pub fn reset(&mut self) {
        self.err_prev = ERR_PREV_FLOOR;
    }

    /// Step factor after an accepted step (`err <= 1`)
    pub fn accept(&mut self, err: f64) -> f64 {
        let alpha = 1.0 / ORDER as f64 - 0.75 * self.beta;
        let factor = if err == 0.0 {
            self.max_factor
        } else {
            self.safety * err.powf(-alpha) * self.err_prev.powf(self.beta)
        };
        self.err_prev = err.max(ERR_PREV_FLOOR);
        factor.clamp(self.min_factor, self.max_factor)
    }

    /// Step factor after a rejected step, always a shrink
    pub fn reject(&self, err: f64) -> f64 {
        if !err.is_finite() {
            return self.min_factor;
        }
        let factor = self.safety * err.powf(-1.0 / ORDER as f64);
        factor.clamp(self.min_factor, 1.0)
    }
}

/// Knobs of a single integration run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorOptions {
    pub tol: Tolerance,
    pub h0: Option<f64>, // initial step, None = automatic
    pub h_min: f64, // absolute step floor (a relative floor always applies)
    pub max_step: Option<f64>, // largest step, None = whole span
    pub max_steps: u64, // step attempts before giving up
    pub controller: StepController,
}

impl Default for IntegratorOptions {
    fn default() -> Self {
        Self {
            tol: Tolerance::default(),
            h0: None,
            h_min: 0.0,
            max_step: None,
            max_steps: 1_000_000,
            controller: StepController::default(),
        }
    }
}

impl IntegratorOptions {
    pub fn with_tol(tol: Tolerance) -> Self {
        Self { tol, ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.tol.validate()?;
        self.controller.validate()?;
        if let Some(h0) = self.h0 {
            if !h0.is_finite() || h0 <= 0.0 {
                return Err(SimError::InvalidInput(format!(
                    "h0 must be positive and finite, got {}",
                    h0
                )));
            }
        }
        if let Some(max_step) = self.max_step {
            if !(max_step > 0.0) {
                return Err(SimError::InvalidInput(format!(
                    "max_step must be positive, got {}",
                    max_step
                )));
            }
        }
        if !self.h_min.is_finite() || self.h_min < 0.0 {
            return Err(SimError::InvalidInput(format!(
                "h_min must be non-negative and finite, got {}",
                self.h_min
            )));
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidInput("max_steps must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Counters for the last run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub fn_evals: u64, // derivative evaluations
    pub accepted_steps: u64,
    pub rejected_steps: u64,
}

/// Result of one trial step
struct TrialStep {
    y_new: StateVector, // 5th order solution
    k: [StateVector; STAGES], // stage derivatives, k[6] = f(t + h, y_new)
    err: f64, // scaled RMS error, infinite if anything blew up
}

/// Continuous extension over one accepted step
struct DenseOutput {
    t_old: f64,
    h: f64,
    r: [StateVector; 5],
}

impl DenseOutput {
    fn new(t_old: f64, h: f64, y: &StateVector, step: &TrialStep) -> Self {
        let k = &step.k;
        let ydiff = step.y_new - y;
        let bspl = k[0] * h - ydiff;
        let r4 = ydiff - k[6] * h - bspl;
        let r5 = (0..STAGES).fold(StateVector::zeros(), |acc, j| acc + k[j] * (h * D[j]));
        Self {
            t_old,
            h,
            r: [*y, ydiff, bspl, r4, r5],
        }
    }

    fn eval(&self, t: f64) -> StateVector {
        let theta = (t - self.t_old) / self.h;
        let theta1 = 1.0 - theta;
        let r = &self.r;
        r[0] + (r[1] + (r[2] + (r[3] + r[4] * theta1) * theta) * theta1) * theta
    }
}

/// Adaptive Dormand–Prince integrator bound to a force law
pub struct Integrator<F = NewtonianGravity> {
    force: F,
    options: IntegratorOptions,
    pub stats: Stats,
}

impl Default for Integrator<NewtonianGravity> {
    fn default() -> Self {
        Self::new(NewtonianGravity::default(), IntegratorOptions::default())
    }
}

impl<F: Acceleration> Integrator<F> {
    pub fn new(force: F, options: IntegratorOptions) -> Self {
        Self {
            force,
            options,
            stats: Stats::default(),
        }
    }

    pub fn options(&self) -> &IntegratorOptions {
        &self.options
    }

    pub fn force(&self) -> &F {
        &self.force
    }

    /// Integrate from `t_start` to `t_end`, sampling every `saveat`.
    ///
    /// The first sample is `state0` at `t_start`, the last one is the accepted
    /// state at exactly `t_end`. Inputs are validated before any work.
    pub fn integrate(
        &mut self,
        state0: &SystemState,
        masses: &Masses,
        t_start: f64,
        t_end: f64,
        saveat: f64,
    ) -> Result<Trajectory, SimError> {
        self.stats = Stats::default();
        self.options.validate()?;
        masses.validate()?;
        if !state0.is_finite() {
            return Err(SimError::InvalidInput("initial state is not finite".to_string()));
        }
        let times = sample_times(t_start, t_end, saveat)?;

        let mut trajectory = Trajectory::with_capacity(times.len());
        trajectory.push(t_start, *state0);
        if times.len() == 1 {
            return Ok(trajectory);
        }

        let span = t_end - t_start;
        let max_step = self.options.max_step.unwrap_or(span).min(span);
        let mut controller = self.options.controller;
        controller.reset();

        let mut t = t_start;
        let mut y = state0.y;
        let mut f0 = self.rhs(&y, masses);
        if !f0.iter().all(|c| c.is_finite()) {
            return Err(SimError::NumericOverflow { t, state: *state0 });
        }

        let mut h = match self.options.h0 {
            Some(h0) => h0.max(self.step_floor(t, span)),
            None => self.initial_step(&y, &f0, masses, span),
        }
        .min(max_step);

        debug!(
            "integrating t = [{}, {}], {} samples, h0 = {:e}",
            t_start,
            t_end,
            times.len(),
            h
        );

        let mut next = 1; // index of the next sample time to fill
        let mut attempts: u64 = 0;
        let mut rejected_last = false;

        while next < times.len() {
            let h_floor = self.step_floor(t, span);

            // stretch the final step instead of leaving a sliver behind
            let last = t + 1.01 * h >= t_end;
            if last {
                h = t_end - t;
            }

            if attempts >= self.options.max_steps || (h < h_floor && !last) {
                warn!(
                    "no convergence at t = {} with h = {:e} after {} attempts",
                    t, h, attempts
                );
                return Err(SimError::NonConvergence {
                    t,
                    step_size: h,
                    state: SystemState::from_vector(y),
                    partial: trajectory,
                });
            }
            attempts += 1;

            let step = self.try_step(&y, &f0, h, masses);

            if step.err <= 1.0 {
                self.stats.accepted_steps += 1;
                let t_new = if last { t_end } else { t + h };

                if times[next] <= t_new {
                    let dense = DenseOutput::new(t, h, &y, &step);
                    while next < times.len() && times[next] <= t_new {
                        let sample = if times[next] == t_new {
                            step.y_new
                        } else {
                            dense.eval(times[next])
                        };
                        trajectory.push(times[next], SystemState::from_vector(sample));
                        next += 1;
                    }
                }

                let mut factor = controller.accept(step.err);
                if rejected_last {
                    factor = factor.min(1.0);
                }
                rejected_last = false;

                t = t_new;
                y = step.y_new;
                f0 = step.k[STAGES - 1];
                h = (h * factor).min(max_step);
            } else {
                self.stats.rejected_steps += 1;
                trace!("rejected step at t = {} with h = {:e}, err = {:e}", t, h, step.err);
                rejected_last = true;
                h *= controller.reject(step.err);
                if h < h_floor {
                    warn!("step size collapsed at t = {} (h = {:e})", t, h);
                    return Err(SimError::NonConvergence {
                        t,
                        step_size: h,
                        state: SystemState::from_vector(y),
                        partial: trajectory,
                    });
                }
            }
        }

        debug!(
            "done: {} accepted, {} rejected, {} derivative evaluations",
            self.stats.accepted_steps, self.stats.rejected_steps, self.stats.fn_evals
        );

        Ok(trajectory)
    }

    fn rhs(&mut self, y: &StateVector, masses: &Masses) -> StateVector {
        self.stats.fn_evals += 1;
        derivative_with(&self.force, &SystemState::from_vector(*y), masses)
    }

    /// One Dormand–Prince step of size `h` from `y`, with `f0 = f(y)`
    fn try_step(&mut self, y: &StateVector, f0: &StateVector, h: f64, masses: &Masses) -> TrialStep {
        let mut k = [StateVector::zeros(); STAGES];
        k[0] = *f0;

        // The last row of A equals the 5th order weights, so the input of
        // the last stage is the solution itself
        let mut y_new = *y;
        for s in 1..STAGES {
            let ys = (0..s).fold(*y, |acc, j| acc + k[j] * (h * A[s][j]));
            k[s] = self.rhs(&ys, masses);
            y_new = ys;
        }

        let err_vec = (0..STAGES).fold(StateVector::zeros(), |acc, j| acc + k[j] * (h * E[j]));

        let finite = y_new.iter().chain(k[STAGES - 1].iter()).all(|c| c.is_finite());
        let err = if finite {
            self.error_norm(&err_vec, y, &y_new)
        } else {
            f64::INFINITY
        };
        // NaN never passes the acceptance test
        let err = if err.is_nan() { f64::INFINITY } else { err };

        TrialStep { y_new, k, err }
    }

    /// Smallest usable step at `t`; grows with |t| so that t + h stays
    /// distinguishable from t
    fn step_floor(&self, t: f64, span: f64) -> f64 {
        self.options.h_min.max(16.0 * f64::EPSILON * t.abs().max(span))
    }

    /// Scaled RMS norm of the local error
    fn error_norm(&self, err: &StateVector, y: &StateVector, y_new: &StateVector) -> f64 {
        let tol = self.options.tol;
        let sum: f64 = (0..STATE_DIM)
            .map(|i| {
                let e = err[i] / tol.scale(y[i], y_new[i]);
                e * e
            })
            .sum();
        (sum / STATE_DIM as f64).sqrt()
    }

    /// Starting step estimate (Hairer, Nørsett & Wanner, II.4)
    fn initial_step(&mut self, y0: &StateVector, f0: &StateVector, masses: &Masses, span: f64) -> f64 {
        let tol = self.options.tol;
        let rms = |v: &StateVector| -> f64 {
            let sum: f64 = (0..STATE_DIM)
                .map(|i| {
                    let e = v[i] / tol.scale(y0[i], y0[i]);
                    e * e
                })
                .sum();
            (sum / STATE_DIM as f64).sqrt()
        };

        let d0 = rms(y0);
        let d1 = rms(f0);
        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        }
        .min(span);

        let y1 = y0 + f0 * h0;
        let f1 = self.rhs(&y1, masses);
        let d2 = rms(&(f1 - f0)) / h0;
        if !d2.is_finite() {
            return h0;
        }

        let dmax = d1.max(d2);
        let h1 = if dmax <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / dmax).powf(1.0 / ORDER as f64)
        };

        (100.0 * h0).min(h1).min(span)
    }
}

/// Integrate with default Newtonian gravity and default controller settings
pub fn integrate(
    state0: &SystemState,
    masses: &Masses,
    t_start: f64,
    t_end: f64,
    saveat: f64,
    tol: impl Into<Tolerance>,
) -> Result<Trajectory, SimError> {
    let options = IntegratorOptions::with_tol(tol.into());
    Integrator::new(NewtonianGravity::default(), options).integrate(state0, masses, t_start, t_end, saveat)
}
