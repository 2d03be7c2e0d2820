//! Simulated annealing over line-arrangement space.
//!
//! Purpose
//! - Global search: a Markov chain that perturbs every line by Gaussian noise
//!   scaled with the temperature, re-normalizes, and accepts by the Metropolis
//!   rule on the energy of `crate::energy`.
//! - Multi-start: many independent chains in parallel, joined after completion.
//!
//! Policies
//! - `ΔE = 0` is accepted (ties count as improvements), the same rule basin
//!   hopping uses for its accept step.
//! - Degenerate candidates have `E = +∞` and are always rejected.
//! - The Metropolis exponent is clamped to `[-700, 0]`; it never overflows.
//! - Cancellation and deadlines are checked between steps only, so callers
//!   always receive a consistent best-so-far snapshot.

mod multistart;
mod runner;
mod types;

pub use multistart::{
    anneal_from, anneal_from_random, best_run, multistart, multistart_from, RunResult,
};
pub use runner::{metropolis_accept, AnnealRunner};
pub use types::{AnnealCfg, AnnealOutcome, Phase, SearchError, SearchState, StopReason};

#[cfg(test)]
mod tests;
