use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::distributions::{Distribution, WeightedIndex};
use rayon::prelude::*;

use crate::anneal::{AnnealRunner, SearchError, StopReason};
use crate::energy::Objective;
use crate::geom::canonical::is_distinct;
use crate::geom::rand::RunToken;
use crate::geom::Arrangement;

use super::types::{BasinCfg, BasinOutcome, Snapshot};

/// Perturb-then-relax driver over one objective.
pub struct BasinHopper<'a, O: Objective + ?Sized> {
    cfg: &'a BasinCfg,
    objective: &'a O,
    stop: Option<&'a AtomicBool>,
}

impl<'a, O: Objective + ?Sized> BasinHopper<'a, O> {
    pub fn new(cfg: &'a BasinCfg, objective: &'a O) -> Result<Self, SearchError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            objective,
            stop: None,
        })
    }

    pub fn with_stop(mut self, flag: &'a AtomicBool) -> Self {
        self.stop = Some(flag);
        self
    }

    /// Run `cfg.kicks` cycles starting from `seed`, drawing from `token`.
    ///
    /// Kicks always start from the retained best. A relaxed result replaces it
    /// when its score is at least the best score, so equal-scoring neighbours
    /// are accepted and retained.
    pub fn run(&self, seed: Arrangement, token: RunToken) -> Result<BasinOutcome, SearchError> {
        let n = self.objective.expanded_len(seed.len());
        if n < 3 {
            return Err(SearchError::TooFewLines { n });
        }
        let schedule = &self.cfg.schedule.steps;
        let picker = WeightedIndex::new(schedule.iter().map(|s| s.weight))
            .map_err(|e| SearchError::invalid(format!("kick weights: {e}")))?;
        let mut rng = token.rng();

        let seed_eval = self.objective.evaluate(&seed);
        let mut best_score = seed_eval.score;
        let expanded = self.objective.expand(&seed);
        let mut best = seed;
        let mut known = vec![expanded.clone()];
        let mut accepted = vec![Snapshot {
            arrangement: expanded,
            score: best_score,
            cycle: None,
            sigma: None,
            distinct: true,
        }];
        let mut history = Vec::with_capacity(self.cfg.kicks as usize);
        let mut stop = StopReason::Budget;
        let started = Instant::now();

        for cycle in 0..self.cfg.kicks {
            if self.stop.is_some_and(|f| f.load(Ordering::Relaxed)) {
                stop = StopReason::Cancelled;
                break;
            }
            if self.cfg.deadline.is_some_and(|d| started.elapsed() >= d) {
                stop = StopReason::Deadline;
                break;
            }
            let sigma = schedule[picker.sample(&mut rng)].sigma;
            let mut kicked = best.clone();
            kicked.perturb(sigma, &mut rng, &self.cfg.geom);

            let relax = self.cfg.relax_cfg(sigma);
            let runner = AnnealRunner::new(relax, self.objective, kicked, &mut rng)?;
            let runner = match self.stop {
                Some(flag) => runner.with_stop(flag),
                None => runner,
            };
            let relaxed = runner.run();

            let eval = self.objective.evaluate(&relaxed.best);
            if !eval.is_degenerate() && eval.score >= best_score {
                let expanded = self.objective.expand(&relaxed.best);
                let distinct = is_distinct(&expanded, &known, self.cfg.distinct_threshold);
                if distinct {
                    known.push(expanded.clone());
                }
                tracing::debug!(cycle, sigma, score = eval.score, distinct, "kick accepted");
                best = relaxed.best;
                best_score = eval.score;
                accepted.push(Snapshot {
                    arrangement: expanded,
                    score: eval.score,
                    cycle: Some(cycle),
                    sigma: Some(sigma),
                    distinct,
                });
            }
            history.push(best_score);
        }

        let cycles = history.len() as u64;
        tracing::info!(
            cycles,
            best_score,
            accepted = accepted.len(),
            distinct = known.len(),
            "basin hopping finished"
        );
        Ok(BasinOutcome {
            best,
            best_score,
            accepted,
            history,
            distinct_variants: known.len(),
            cycles,
            stop,
        })
    }
}

/// Refine several seeds in parallel, one independent chain each; results keep input order.
pub fn refine_many<O: Objective + ?Sized>(
    seeds: &[(Arrangement, RunToken)],
    cfg: &BasinCfg,
    objective: &O,
    stop: Option<&AtomicBool>,
) -> Result<Vec<BasinOutcome>, SearchError> {
    let hopper = BasinHopper::new(cfg, objective)?;
    let hopper = match stop {
        Some(flag) => hopper.with_stop(flag),
        None => hopper,
    };
    seeds
        .par_iter()
        .map(|(seed, token)| hopper.run(seed.clone(), *token))
        .collect()
}
