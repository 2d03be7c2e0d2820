//! Single Metropolis chain: `Initializing → Cooling → Converged`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::Rng;

use crate::energy::{Evaluation, Objective};
use crate::geom::Arrangement;

use super::types::{AnnealCfg, AnnealOutcome, Phase, SearchError, SearchState, StopReason};

/// Lower clamp for the Metropolis exponent `−ΔE/T` (`exp(−700)` is still a normal f64).
const MIN_EXPONENT: f64 = -700.0;

/// Metropolis rule. Ties (`ΔE = 0`) are accepted; `NaN` (∞ − ∞) is rejected.
#[inline]
pub fn metropolis_accept<R: Rng + ?Sized>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    if delta.is_nan() {
        return false;
    }
    if delta <= 0.0 {
        return true;
    }
    if !delta.is_finite() {
        return false;
    }
    let exponent = (-delta / temperature).clamp(MIN_EXPONENT, 0.0);
    rng.gen::<f64>() < exponent.exp()
}

/// One annealing run over `objective`, driven by its own RNG.
pub struct AnnealRunner<'a, O: Objective + ?Sized, R: Rng> {
    cfg: AnnealCfg,
    objective: &'a O,
    rng: R,
    phase: Phase,
    state: SearchState,
    stop: Option<&'a AtomicBool>,
}

impl<'a, O: Objective + ?Sized, R: Rng> AnnealRunner<'a, O, R> {
    /// Validate parameters; no step is taken here.
    pub fn new(
        cfg: AnnealCfg,
        objective: &'a O,
        initial: Arrangement,
        rng: R,
    ) -> Result<Self, SearchError> {
        cfg.validate()?;
        let n = objective.expanded_len(initial.len());
        if n < 3 {
            return Err(SearchError::TooFewLines { n });
        }
        let state = SearchState {
            current: initial.clone(),
            current_eval: Evaluation::DEGENERATE,
            temperature: cfg.t0,
            best: initial.clone(),
            best_score: 0,
            lowest: initial,
            lowest_energy: f64::INFINITY,
            iter: 0,
            accepted: 0,
            rejected_lines: 0,
        };
        Ok(Self {
            cfg,
            objective,
            rng,
            phase: Phase::Initializing,
            state,
            stop: None,
        })
    }

    /// Stop cooperatively when `flag` becomes true (checked between steps).
    pub fn with_stop(mut self, flag: &'a AtomicBool) -> Self {
        self.stop = Some(flag);
        self
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Advance the state machine by one transition.
    pub fn step(&mut self) -> Phase {
        match self.phase {
            Phase::Initializing => self.initialize(),
            Phase::Cooling => self.cool_step(),
            Phase::Converged(_) => {}
        }
        self.phase
    }

    fn initialize(&mut self) {
        let st = &mut self.state;
        st.temperature = self.cfg.t0;
        st.current_eval = self.objective.evaluate(&st.current);
        st.best_score = st.current_eval.score;
        st.lowest_energy = st.current_eval.energy;
        self.phase = Phase::Cooling;
    }

    fn cool_step(&mut self) {
        let st = &mut self.state;
        let mut candidate = st.current.clone();
        let sigma = self.cfg.sigma * st.temperature;
        let rejected = candidate.perturb(sigma, &mut self.rng, &self.cfg.geom);
        st.rejected_lines += rejected as u64;
        let eval = self.objective.evaluate(&candidate);
        let delta = eval.energy - st.current_eval.energy;
        if metropolis_accept(delta, st.temperature, &mut self.rng) {
            st.current = candidate;
            st.current_eval = eval;
            st.accepted += 1;
            if eval.score > st.best_score {
                st.best = st.current.clone();
                st.best_score = eval.score;
                tracing::trace!(iter = st.iter, score = eval.score, "new best");
            }
            if eval.energy < st.lowest_energy {
                st.lowest = st.current.clone();
                st.lowest_energy = eval.energy;
            }
        }
        st.iter += 1;
        if st.iter % self.cfg.decay_every == 0 {
            st.temperature *= self.cfg.alpha;
        }
        if st.temperature < self.cfg.tf {
            self.phase = Phase::Converged(StopReason::Cooled);
        } else if st.iter >= self.cfg.max_iters {
            self.phase = Phase::Converged(StopReason::Budget);
        }
    }

    /// Step until converged, cancelled, or past the deadline.
    pub fn run(mut self) -> AnnealOutcome {
        let started = Instant::now();
        loop {
            if let Phase::Converged(_) = self.phase {
                break;
            }
            if self.stop.is_some_and(|f| f.load(Ordering::Relaxed)) {
                self.phase = Phase::Converged(StopReason::Cancelled);
                break;
            }
            if self.cfg.deadline.is_some_and(|d| started.elapsed() >= d) {
                self.phase = Phase::Converged(StopReason::Deadline);
                break;
            }
            self.step();
        }
        let stop = match self.phase {
            Phase::Converged(reason) => reason,
            _ => StopReason::Budget,
        };
        let st = self.state;
        AnnealOutcome {
            best: st.best,
            best_score: st.best_score,
            lowest: st.lowest,
            lowest_energy: st.lowest_energy,
            iterations: st.iter,
            accepted: st.accepted,
            rejected_lines: st.rejected_lines,
            final_temperature: st.temperature,
            stop,
        }
    }
}
