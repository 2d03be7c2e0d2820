use std::time::Duration;

use crate::anneal::{AnnealCfg, SearchError, StopReason};
use crate::geom::{Arrangement, GeomCfg};

/// One entry of the kick schedule: Gaussian step `sigma`, drawn with probability `weight`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KickStep {
    pub sigma: f64,
    pub weight: f64,
}

/// Categorical distribution over kick magnitudes.
#[derive(Clone, Debug, PartialEq)]
pub struct KickSchedule {
    pub steps: Vec<KickStep>,
}

impl KickSchedule {
    pub fn new(steps: Vec<KickStep>) -> Self {
        Self { steps }
    }

    pub fn min_sigma(&self) -> f64 {
        self.steps
            .iter()
            .map(|s| s.sigma)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.steps.is_empty() {
            return Err(SearchError::invalid("kick schedule is empty"));
        }
        for s in &self.steps {
            if !(s.sigma.is_finite() && s.sigma > 0.0) {
                return Err(SearchError::invalid("kick sigma must be finite and > 0"));
            }
            if !(s.weight.is_finite() && s.weight >= 0.0) {
                return Err(SearchError::invalid("kick weight must be finite and >= 0"));
            }
        }
        let total: f64 = self.steps.iter().map(|s| s.weight).sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(SearchError::invalid(format!(
                "kick weights must sum to 1, got {total}"
            )));
        }
        Ok(())
    }
}

impl Default for KickSchedule {
    /// Large, medium and small kicks.
    fn default() -> Self {
        Self::new(vec![
            KickStep { sigma: 0.5, weight: 0.3 },
            KickStep { sigma: 0.1, weight: 0.4 },
            KickStep { sigma: 0.01, weight: 0.3 },
        ])
    }
}

/// Basin-hopping parameters.
///
/// Each relax phase is a geometric annealing run from `T0 = σ` (the kick size)
/// down to `relax_tf` over `relax_iters` steps with perturbation scale `relax_sigma`.
#[derive(Clone, Debug, PartialEq)]
pub struct BasinCfg {
    pub kicks: u64,
    pub schedule: KickSchedule,
    pub relax_iters: u64,
    pub relax_tf: f64,
    pub relax_sigma: f64,
    /// Parameter-space distance above which an accepted arrangement counts as a new variant.
    pub distinct_threshold: f64,
    pub deadline: Option<Duration>,
    pub geom: GeomCfg,
}

impl Default for BasinCfg {
    fn default() -> Self {
        Self {
            kicks: 50,
            schedule: KickSchedule::default(),
            relax_iters: 5_000,
            relax_tf: 1e-4,
            relax_sigma: 0.1,
            distinct_threshold: 0.1,
            deadline: None,
            geom: GeomCfg::default(),
        }
    }
}

impl BasinCfg {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.kicks == 0 {
            return Err(SearchError::invalid("kicks must be >= 1"));
        }
        self.schedule.validate()?;
        if self.relax_iters == 0 {
            return Err(SearchError::invalid("relax_iters must be >= 1"));
        }
        if !(self.relax_tf.is_finite() && self.relax_tf > 0.0) {
            return Err(SearchError::invalid("relax_tf must be finite and > 0"));
        }
        if self.relax_tf >= self.schedule.min_sigma() {
            return Err(SearchError::invalid(
                "relax_tf must lie below the smallest kick sigma",
            ));
        }
        if !(self.relax_sigma.is_finite() && self.relax_sigma > 0.0) {
            return Err(SearchError::invalid("relax_sigma must be finite and > 0"));
        }
        if self.distinct_threshold.is_nan() || self.distinct_threshold < 0.0 {
            return Err(SearchError::invalid("distinct_threshold must be >= 0"));
        }
        for step in &self.schedule.steps {
            let relax = self.relax_cfg(step.sigma);
            if let Err(SearchError::InvalidParams { reason }) = relax.validate() {
                return Err(SearchError::invalid(format!(
                    "relaxation after kick sigma {}: {reason}",
                    step.sigma
                )));
            }
        }
        Ok(())
    }

    /// Relaxation schedule after a kick of size `sigma`: `T0 = sigma` down to `relax_tf`.
    pub fn relax_cfg(&self, sigma: f64) -> AnnealCfg {
        AnnealCfg {
            sigma: self.relax_sigma,
            geom: self.geom,
            ..AnnealCfg::geometric(sigma, self.relax_tf, self.relax_iters)
        }
    }
}

/// Immutable copy of an accepted arrangement, as scored (expanded form).
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub arrangement: Arrangement,
    pub score: usize,
    /// Cycle that produced it; `None` for the seed.
    pub cycle: Option<u64>,
    /// Kick size of that cycle.
    pub sigma: Option<f64>,
    /// Geometrically distinct from every earlier snapshot.
    pub distinct: bool,
}

#[derive(Clone, Debug)]
pub struct BasinOutcome {
    /// Final retained best, in the objective's state space.
    pub best: Arrangement,
    pub best_score: usize,
    /// Seed followed by every accepted arrangement, in acceptance order.
    pub accepted: Vec<Snapshot>,
    /// Best score after each completed cycle; non-decreasing.
    pub history: Vec<usize>,
    pub distinct_variants: usize,
    pub cycles: u64,
    pub stop: StopReason,
}
