//! Basin hopping: iterated local search around a retained best arrangement.
//!
//! Purpose
//! - Diversify optima. Each cycle kicks the retained best `B*` with Gaussian
//!   noise of a size drawn from a categorical schedule, relaxes it with a short
//!   low-temperature annealing run, and replaces `B*` when the relaxed score is
//!   at least as good.
//!
//! Policies
//! - Kicks always start from `B*`; rejected kicks leave no trace.
//! - Ties are accepted. Equal-scoring but structurally different optima are
//!   what the classifier later separates into families.
//! - Every accepted arrangement is kept as an immutable `Snapshot`; the best
//!   score history is non-decreasing.
//!
//! Code cross-refs: `crate::anneal` (relax phase), `crate::geom::canonical`
//! (distinct-variant counting), `crate::classify` (consumer of snapshots).

mod hopper;
mod types;

pub use hopper::{refine_many, BasinHopper};
pub use types::{BasinCfg, BasinOutcome, KickSchedule, KickStep, Snapshot};

#[cfg(test)]
mod tests;
