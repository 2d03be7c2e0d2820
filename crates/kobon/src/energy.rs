//! Search objectives: negative score plus an optional soft-symmetry penalty.
//!
//! `E(arr) = −score(arr) + λ · Σ_(i,π(i)) d(reflect(L_i), L_π(i))²`
//!
//! Degenerate arrangements (parallel pair or concurrent triple) evaluate to
//! `E = +∞` with score 0, so the Metropolis rule never accepts them.

use crate::geom::{triangles, Arrangement, GeomCfg};
use crate::symmetry::SymmetryPenalty;

/// Energy and score of one state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub energy: f64,
    pub score: usize,
}

impl Evaluation {
    pub const DEGENERATE: Evaluation = Evaluation {
        energy: f64::INFINITY,
        score: 0,
    };

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !self.energy.is_finite()
    }
}

/// Minimization objective over a search state.
///
/// The search state may be a reduced parametrization (see `MirroredObjective`);
/// `expand` maps it to the arrangement that is actually scored.
pub trait Objective: Sync {
    fn evaluate(&self, state: &Arrangement) -> Evaluation;

    fn expand(&self, state: &Arrangement) -> Arrangement {
        state.clone()
    }

    /// Line count of the expanded arrangement for a state with `n` lines.
    fn expanded_len(&self, n: usize) -> usize {
        n
    }
}

/// `−score`, optionally plus a soft symmetry penalty.
#[derive(Clone, Debug, Default)]
pub struct EnergyFunction {
    pub cfg: GeomCfg,
    pub symmetry: Option<SymmetryPenalty>,
}

impl EnergyFunction {
    pub fn new(cfg: GeomCfg) -> Self {
        Self {
            cfg,
            symmetry: None,
        }
    }

    pub fn with_symmetry(mut self, penalty: SymmetryPenalty) -> Self {
        self.symmetry = Some(penalty);
        self
    }
}

impl Objective for EnergyFunction {
    fn evaluate(&self, state: &Arrangement) -> Evaluation {
        let scan = triangles(state, &self.cfg);
        if !scan.is_general_position() {
            return Evaluation::DEGENERATE;
        }
        let score = scan.score();
        let penalty = self.symmetry.as_ref().map_or(0.0, |p| p.penalty(state));
        Evaluation {
            energy: -(score as f64) + penalty,
            score,
        }
    }
}
