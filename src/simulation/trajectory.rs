//! Sampled output of an integration run.
//!
//! A [`Trajectory`] is append-only while the integrator fills it and
//! read-only afterwards. Renderers pull per-body paths out of it.

use crate::simulation::error::SimError;
use crate::simulation::states::{NVec2, SystemState, N_BODIES};

/// One output sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub t: f64,
    pub state: SystemState,
}

/// Ordered `(t, state)` samples, `t` strictly increasing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    samples: Vec<Sample>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            samples: Vec::with_capacity(n),
        }
    }

    /// Append a sample. Only the integrator writes.
    pub(crate) fn push(&mut self, t: f64, state: SystemState) {
        debug_assert!(
            self.samples.last().map_or(true, |s| t > s.t),
            "sample times must be strictly increasing"
        );
        self.samples.push(Sample { t, state });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.t).collect()
    }

    /// State at the end of the run
    pub fn final_state(&self) -> Option<SystemState> {
        self.samples.last().map(|s| s.state)
    }

    /// Position of body `body` at every sample, for drawing its path
    pub fn body_path(&self, body: usize) -> Vec<NVec2> {
        self.samples.iter().map(|s| s.state.position(body)).collect()
    }

    /// Positions of all bodies at sample `k`, for the current-position markers
    pub fn positions_at(&self, k: usize) -> Option<[NVec2; N_BODIES]> {
        self.samples.get(k).map(|s| s.state.positions())
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Upper bound on the number of output intervals in one run
pub const MAX_SAMPLES: f64 = 1e8;

/// Output times `t_start, t_start + saveat, ..., t_end`.
///
/// Times are `t_start + k * saveat` so rounding does not accumulate. The last
/// time is always exactly `t_end`; when the span is not a whole number of
/// intervals `t_end` is appended after the last full interval.
pub fn sample_times(t_start: f64, t_end: f64, saveat: f64) -> Result<Vec<f64>, SimError> {
    if !t_start.is_finite() || !t_end.is_finite() {
        return Err(SimError::InvalidInput(format!(
            "time span must be finite, got [{}, {}]",
            t_start, t_end
        )));
    }
    if t_end < t_start {
        return Err(SimError::InvalidInput(format!(
            "t_end ({}) is before t_start ({})",
            t_end, t_start
        )));
    }
    if !saveat.is_finite() || saveat <= 0.0 {
        return Err(SimError::InvalidInput(format!(
            "saveat must be positive and finite, got {}",
            saveat
        )));
    }

    let span = t_end - t_start;
    if !span.is_finite() {
        return Err(SimError::InvalidInput(format!(
            "time span [{}, {}] overflows",
            t_start, t_end
        )));
    }
    if span == 0.0 {
        return Ok(vec![t_start]);
    }

    let ratio = span / saveat;
    if ratio > MAX_SAMPLES {
        return Err(SimError::InvalidInput(format!(
            "saveat {} gives {:e} samples, at most {:e} are allowed",
            saveat, ratio, MAX_SAMPLES
        )));
    }
    let nearest = ratio.round();
    // spans that are a whole number of intervals up to rounding noise
    let whole = nearest >= 1.0 && (ratio - nearest).abs() <= 1e-9 * nearest;
    let n = if whole { nearest } else { ratio.floor() } as usize;

    let mut times: Vec<f64> = (0..=n).map(|k| t_start + k as f64 * saveat).collect();
    if whole {
        if let Some(last) = times.last_mut() {
            *last = t_end;
        }
    } else if times.last().map_or(true, |&t| t < t_end) {
        times.push(t_end);
    }
    // guard against a rounded grid point landing on or past its successor
    times.dedup_by(|later, earlier| *later <= *earlier);

    Ok(times)
}
