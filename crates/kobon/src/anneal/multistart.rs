//! Independent annealing chains from random or fixed starts, run in parallel.
//!
//! Each run owns its RNG (`RunToken { seed, index }`) and its state; results
//! are joined in index order once every run has finished.

use std::sync::atomic::AtomicBool;

use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::energy::Objective;
use crate::geom::rand::RunToken;
use crate::geom::Arrangement;

use super::runner::AnnealRunner;
use super::types::{AnnealCfg, AnnealOutcome, SearchError};

/// Outcome of run `index` of a multi-start batch.
#[derive(Clone, Debug)]
pub struct RunResult {
    pub index: u64,
    pub token: RunToken,
    pub outcome: AnnealOutcome,
}

/// One annealing run from a random `n_lines` start drawn from `token`.
pub fn anneal_from_random<O: Objective + ?Sized>(
    n_lines: usize,
    token: RunToken,
    cfg: &AnnealCfg,
    objective: &O,
    stop: Option<&AtomicBool>,
) -> Result<AnnealOutcome, SearchError> {
    let mut rng = token.rng();
    let initial = Arrangement::random(n_lines, &mut rng, &cfg.geom);
    chain(initial, rng, cfg, objective, stop)
}

/// One annealing run from `initial`; the perturbation stream comes from `token`.
pub fn anneal_from<O: Objective + ?Sized>(
    initial: Arrangement,
    token: RunToken,
    cfg: &AnnealCfg,
    objective: &O,
    stop: Option<&AtomicBool>,
) -> Result<AnnealOutcome, SearchError> {
    chain(initial, token.rng(), cfg, objective, stop)
}

fn chain<O: Objective + ?Sized>(
    initial: Arrangement,
    rng: StdRng,
    cfg: &AnnealCfg,
    objective: &O,
    stop: Option<&AtomicBool>,
) -> Result<AnnealOutcome, SearchError> {
    let runner = AnnealRunner::new(*cfg, objective, initial, rng)?;
    let runner = match stop {
        Some(flag) => runner.with_stop(flag),
        None => runner,
    };
    Ok(runner.run())
}

/// `runs` independent chains seeded from `(seed, 0..runs)`.
///
/// Parameters are validated once before any chain starts.
pub fn multistart<O: Objective + ?Sized>(
    n_lines: usize,
    runs: u64,
    seed: u64,
    cfg: &AnnealCfg,
    objective: &O,
    stop: Option<&AtomicBool>,
) -> Result<Vec<RunResult>, SearchError> {
    run_batch(n_lines, runs, seed, cfg, objective, |token| {
        anneal_from_random(n_lines, token, cfg, objective, stop)
    })
}

/// `runs` chains that all start at `initial`, each with its own stream `(seed, index)`.
///
/// Used to re-anneal a stored arrangement under a different objective
/// (soft symmetry penalty, mirrored parametrization).
pub fn multistart_from<O: Objective + ?Sized>(
    initial: &Arrangement,
    runs: u64,
    seed: u64,
    cfg: &AnnealCfg,
    objective: &O,
    stop: Option<&AtomicBool>,
) -> Result<Vec<RunResult>, SearchError> {
    run_batch(initial.len(), runs, seed, cfg, objective, |token| {
        anneal_from(initial.clone(), token, cfg, objective, stop)
    })
}

fn run_batch<O, F>(
    n_lines: usize,
    runs: u64,
    seed: u64,
    cfg: &AnnealCfg,
    objective: &O,
    run_one: F,
) -> Result<Vec<RunResult>, SearchError>
where
    O: Objective + ?Sized,
    F: Fn(RunToken) -> Result<AnnealOutcome, SearchError> + Sync,
{
    cfg.validate()?;
    let n = objective.expanded_len(n_lines);
    if n < 3 {
        return Err(SearchError::TooFewLines { n });
    }
    if runs == 0 {
        return Err(SearchError::invalid("runs must be >= 1"));
    }
    let results = (0..runs)
        .into_par_iter()
        .map(|index| -> Result<RunResult, SearchError> {
            let token = RunToken::new(seed, index);
            let outcome = run_one(token)?;
            tracing::debug!(
                run = index,
                score = outcome.best_score,
                iters = outcome.iterations,
                stop = ?outcome.stop,
                "annealing run finished"
            );
            Ok(RunResult {
                index,
                token,
                outcome,
            })
        })
        .collect::<Result<Vec<_>, SearchError>>()?;
    if let Some(best) = best_run(&results) {
        tracing::info!(
            runs,
            best_score = best.outcome.best_score,
            best_run = best.index,
            "multistart finished"
        );
    }
    Ok(results)
}

/// Highest-scoring run; ties go to the lowest index.
pub fn best_run(results: &[RunResult]) -> Option<&RunResult> {
    results.iter().fold(None, |acc: Option<&RunResult>, r| match acc {
        Some(b) if b.outcome.best_score >= r.outcome.best_score => Some(b),
        _ => Some(r),
    })
}
