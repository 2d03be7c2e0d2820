//! Configuration, state and outcome types for annealing runs.

use std::fmt;
use std::time::Duration;

use crate::energy::Evaluation;
use crate::geom::{Arrangement, GeomCfg};

/// Fatal parameter errors, raised before any run starts.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchError {
    InvalidParams { reason: String },
    TooFewLines { n: usize },
}

impl SearchError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParams { reason } => write!(f, "invalid search params: {reason}"),
            Self::TooFewLines { n } => write!(f, "need at least 3 lines, got {n}"),
        }
    }
}

impl std::error::Error for SearchError {}

/// Annealing schedule and budget.
///
/// Each step perturbs every parameter by `N(0, (σ·T)²)`. Every `decay_every`
/// steps `T ← α·T`. The run converges when `T < tf`, after `max_iters` steps,
/// or when the optional wall-clock `deadline` has elapsed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnealCfg {
    pub t0: f64,
    pub tf: f64,
    pub alpha: f64,
    pub decay_every: u64,
    pub sigma: f64,
    pub max_iters: u64,
    pub deadline: Option<Duration>,
    pub geom: GeomCfg,
}

impl AnnealCfg {
    /// Per-step decay with `α = (tf/t0)^(1/iters)`, so `T` reaches `tf` at the budget end.
    pub fn geometric(t0: f64, tf: f64, iters: u64) -> Self {
        let alpha = if iters > 0 && t0 > 0.0 && tf > 0.0 {
            (tf / t0).powf(1.0 / iters as f64)
        } else {
            f64::NAN
        };
        Self {
            t0,
            tf,
            alpha,
            decay_every: 1,
            sigma: 0.1,
            max_iters: iters,
            deadline: None,
            geom: GeomCfg::default(),
        }
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if !(self.t0.is_finite() && self.t0 > 0.0) {
            return Err(SearchError::invalid("t0 must be finite and > 0"));
        }
        if !(self.tf.is_finite() && self.tf > 0.0) {
            return Err(SearchError::invalid("tf must be finite and > 0"));
        }
        if self.tf >= self.t0 {
            return Err(SearchError::invalid("tf < t0 required"));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(SearchError::invalid("alpha must lie in (0, 1)"));
        }
        if self.decay_every == 0 {
            return Err(SearchError::invalid("decay_every must be >= 1"));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(SearchError::invalid("sigma must be finite and > 0"));
        }
        if self.max_iters == 0 {
            return Err(SearchError::invalid("max_iters must be >= 1"));
        }
        Ok(())
    }
}

impl Default for AnnealCfg {
    fn default() -> Self {
        Self::geometric(1.0, 1e-3, 100_000)
    }
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Temperature fell below `tf`.
    Cooled,
    /// `max_iters` steps taken.
    Budget,
    Deadline,
    Cancelled,
}

/// Lifecycle of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Cooling,
    Converged(StopReason),
}

/// Mutable state of one Markov chain; owned by exactly one runner.
#[derive(Clone, Debug)]
pub struct SearchState {
    pub current: Arrangement,
    pub current_eval: Evaluation,
    pub temperature: f64,
    pub best: Arrangement,
    pub best_score: usize,
    /// Lowest-energy state seen (differs from `best` only under a penalty term).
    pub lowest: Arrangement,
    pub lowest_energy: f64,
    pub iter: u64,
    pub accepted: u64,
    pub rejected_lines: u64,
}

/// Snapshot returned when a run converges.
#[derive(Clone, Debug)]
pub struct AnnealOutcome {
    pub best: Arrangement,
    pub best_score: usize,
    pub lowest: Arrangement,
    pub lowest_energy: f64,
    pub iterations: u64,
    pub accepted: u64,
    pub rejected_lines: u64,
    pub final_temperature: f64,
    pub stop: StopReason,
}
