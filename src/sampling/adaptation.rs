//! Warm-up adaptation for Hamiltonian Monte Carlo.
//!
//! - [`DualAveraging`]: step-size adaptation toward a target acceptance
//!   probability (Nesterov dual averaging, `γ = 0.05`, `t0 = 10`, `κ = 0.75`).
//! - [`RunningVariance`]: Welford accumulator of per-coordinate variances.
//! - [`MassAdaptation`]: windowed diagonal mass-matrix estimation. Windows
//!   double in length between an initial and a terminal fast buffer; each
//!   window's variance is shrunk toward `1e-3` before use.
//! - [`WarmUp`]: drives both over the warm-up iterations of one chain.
use ndarray::Array1;

const GAMMA: f64 = 0.05;
const T0: f64 = 10.0;
const KAPPA: f64 = 0.75;

const INIT_BUFFER: usize = 75;
const TERM_BUFFER: usize = 50;
const BASE_WINDOW: usize = 25;

/// Dual-averaging step-size adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct DualAveraging {
    target: f64,
    mu: f64,
    counter: f64,
    h_bar: f64,
    log_step_bar: f64,
}

impl DualAveraging {
    pub fn new(step_size: f64, target: f64) -> Self {
        Self { target, mu: (10.0 * step_size).ln(), counter: 0.0, h_bar: 0.0, log_step_bar: 0.0 }
    }

    /// Restart around a new step size (after the mass matrix changed).
    pub fn restart(&mut self, step_size: f64) {
        *self = Self::new(step_size, self.target);
    }

    /// Feed one acceptance probability; returns the step size to use next.
    pub fn update(&mut self, accept_prob: f64) -> f64 {
        self.counter += 1.0;
        let eta = 1.0 / (self.counter + T0);
        self.h_bar = (1.0 - eta) * self.h_bar + eta * (self.target - accept_prob);
        let log_step = self.mu - self.counter.sqrt() / GAMMA * self.h_bar;
        let weight = self.counter.powf(-KAPPA);
        self.log_step_bar = weight * log_step + (1.0 - weight) * self.log_step_bar;
        log_step.exp()
    }

    /// Averaged step size used after warm-up.
    pub fn final_step_size(&self) -> f64 {
        self.log_step_bar.exp()
    }
}

/// Welford running mean/variance per coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningVariance {
    count: usize,
    mean: Array1<f64>,
    m2: Array1<f64>,
}

impl RunningVariance {
    pub fn new(dim: usize) -> Self {
        Self { count: 0, mean: Array1::zeros(dim), m2: Array1::zeros(dim) }
    }

    pub fn add(&mut self, x: &Array1<f64>) {
        self.count += 1;
        let delta = x - &self.mean;
        self.mean.scaled_add(1.0 / self.count as f64, &delta);
        let delta2 = x - &self.mean;
        self.m2 += &(&delta * &delta2);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Sample variance, shrunk toward `1e-3` with weight `5 / (n + 5)`.
    /// `None` with fewer than two observations.
    pub fn regularized_variance(&self) -> Option<Array1<f64>> {
        if self.count < 2 {
            return None;
        }
        let n = self.count as f64;
        let var = &self.m2 / (n - 1.0);
        Some(var.mapv(|v| (n / (n + 5.0)) * v + 1e-3 * (5.0 / (n + 5.0))))
    }
}

/// Windowed diagonal mass-matrix adaptation over `tune` warm-up iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct MassAdaptation {
    start: usize,
    window_ends: Vec<usize>,
    estimator: RunningVariance,
}

impl MassAdaptation {
    pub fn new(dim: usize, tune: usize) -> Self {
        let (start, window_ends) = window_schedule(tune);
        Self { start, window_ends, estimator: RunningVariance::new(dim) }
    }

    /// Record the position after warm-up iteration `iteration` (0-based).
    /// Returns a new inverse mass diagonal when a window closes.
    pub fn observe(&mut self, iteration: usize, theta: &Array1<f64>) -> Option<Array1<f64>> {
        let Some(&last) = self.window_ends.last() else { return None };
        if iteration < self.start || iteration >= last {
            return None;
        }
        self.estimator.add(theta);
        if !self.window_ends.contains(&(iteration + 1)) {
            return None;
        }
        let variance = self.estimator.regularized_variance();
        self.estimator = RunningVariance::new(theta.len());
        variance
    }
}

/// Step size and, when a mass window just closed, the new inverse mass
/// diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuned {
    pub step_size: f64,
    pub inv_mass: Option<Array1<f64>>,
}

/// Warm-up controller of one chain: dual averaging plus windowed mass
/// adaptation. The step size returned for the last warm-up iteration is the
/// averaged one that sampling keeps.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmUp {
    tune: usize,
    dual: DualAveraging,
    mass: MassAdaptation,
}

impl WarmUp {
    pub fn new(dim: usize, tune: usize, step_size: f64, target: f64) -> Self {
        Self { tune, dual: DualAveraging::new(step_size, target), mass: MassAdaptation::new(dim, tune) }
    }

    /// Feed warm-up iteration `iteration` (`< tune`).
    pub fn observe(&mut self, iteration: usize, accept_prob: f64, theta: &Array1<f64>) -> Tuned {
        let mut step_size = self.dual.update(accept_prob);
        let inv_mass = self.mass.observe(iteration, theta);
        let last = iteration + 1 == self.tune;
        // A restart on the last iteration would discard the averaged step.
        if inv_mass.is_some() && !last {
            self.dual.restart(step_size);
        }
        if last {
            step_size = self.dual.final_step_size();
        }
        Tuned { step_size, inv_mass }
    }
}

/// First slow-window iteration and the end (exclusive) of every window.
fn window_schedule(tune: usize) -> (usize, Vec<usize>) {
    let (init, term, base) = if tune >= INIT_BUFFER + TERM_BUFFER + BASE_WINDOW {
        (INIT_BUFFER, TERM_BUFFER, BASE_WINDOW)
    } else {
        let init = tune * 15 / 100;
        let term = (tune / 10).max(usize::from(tune > 0));
        (init, term, tune - init - term)
    };
    if base == 0 {
        return (init, Vec::new());
    }
    let end = tune - term;
    let mut ends = Vec::new();
    let (mut position, mut size) = (init, base);
    while position < end {
        let mut next = position + size;
        if next + 2 * size > end {
            next = end;
        }
        ends.push(next);
        position = next;
        size *= 2;
    }
    (init, ends)
}
