//! End-to-end discovery: multistart annealing → basin hopping → classification.
//!
//! Best-of-run arrangements seed independent basin-hopping chains; the
//! snapshots those chains accept are fingerprinted and grouped into families.

use std::sync::atomic::AtomicBool;

use crate::anneal::{multistart, AnnealCfg, RunResult, SearchError};
use crate::basin::{refine_many, BasinCfg, BasinOutcome};
use crate::classify::{classify, Classification, ClassifyCfg, Entry};
use crate::energy::Objective;

/// Which accepted snapshots go to classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Retain {
    /// Only snapshots reaching the best score found.
    #[default]
    TopScore,
    /// Every accepted snapshot.
    AllAccepted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineCfg {
    pub n_lines: usize,
    pub runs: u64,
    pub seed: u64,
    pub anneal: AnnealCfg,
    pub basin: BasinCfg,
    /// Number of best-of-run arrangements refined by basin hopping.
    pub refine_top: usize,
    pub classify: ClassifyCfg,
    pub retain: Retain,
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            n_lines: 10,
            runs: 20,
            seed: 0,
            anneal: AnnealCfg::default(),
            basin: BasinCfg::default(),
            refine_top: 5,
            classify: ClassifyCfg::default(),
            retain: Retain::TopScore,
        }
    }
}

impl PipelineCfg {
    pub fn validate(&self) -> Result<(), SearchError> {
        self.anneal.validate()?;
        self.basin.validate()?;
        if self.runs == 0 {
            return Err(SearchError::invalid("runs must be >= 1"));
        }
        if self.refine_top == 0 {
            return Err(SearchError::invalid("refine_top must be >= 1"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Discovery {
    pub runs: Vec<RunResult>,
    pub refinements: Vec<BasinOutcome>,
    /// Retained snapshots, ids in refinement then acceptance order.
    pub entries: Vec<Entry>,
    pub best_score: usize,
    pub classification: Classification,
}

/// Run indices ordered by best score (descending), ties by index.
fn ranked(runs: &[RunResult]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..runs.len()).collect();
    order.sort_by(|&i, &j| {
        runs[j]
            .outcome
            .best_score
            .cmp(&runs[i].outcome.best_score)
            .then(i.cmp(&j))
    });
    order
}

pub fn discover<O: Objective + ?Sized>(
    cfg: &PipelineCfg,
    objective: &O,
    stop: Option<&AtomicBool>,
) -> Result<Discovery, SearchError> {
    cfg.validate()?;
    let runs = multistart(cfg.n_lines, cfg.runs, cfg.seed, &cfg.anneal, objective, stop)?;

    let seeds: Vec<_> = ranked(&runs)
        .into_iter()
        .take(cfg.refine_top)
        .map(|k| (runs[k].outcome.best.clone(), runs[k].token.child(1)))
        .collect();
    let refinements = refine_many(&seeds, &cfg.basin, objective, stop)?;

    let best_score = refinements
        .iter()
        .flat_map(|r| r.accepted.iter().map(|s| s.score))
        .max()
        .unwrap_or(0);
    let entries: Vec<Entry> = refinements
        .iter()
        .flat_map(|r| r.accepted.iter())
        .filter(|s| cfg.retain == Retain::AllAccepted || s.score == best_score)
        .enumerate()
        .map(|(id, s)| Entry {
            id,
            arrangement: s.arrangement.clone(),
            score: s.score,
        })
        .collect();
    tracing::info!(
        seeds = seeds.len(),
        best_score,
        retained = entries.len(),
        "refinement finished"
    );

    let classification = classify(&entries, &cfg.classify);
    Ok(Discovery {
        runs,
        refinements,
        entries,
        best_score,
        classification,
    })
}
