//! Ordered line arrangements.
//!
//! Indices `0..N` are fixed for the lifetime of an arrangement; perturbations
//! mutate lines in place, snapshots are plain clones.

use nalgebra::{Matrix3, MatrixXx3, Vector3};
use rand::Rng;
use rand_distr::StandardNormal;

use super::types::{GeomCfg, GeomError, Line};

/// Ordered sequence of lines in unit-normal form.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Arrangement {
    lines: Vec<Line>,
}

impl Arrangement {
    #[inline]
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    /// Build from raw `[a, b, c]` rows, normalizing each one.
    pub fn from_rows(rows: &[[f64; 3]], cfg: &GeomCfg) -> Result<Self, GeomError> {
        let lines = rows
            .iter()
            .map(|r| Line::new(r[0], r[1], r[2], cfg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { lines })
    }

    pub fn to_rows(&self) -> Vec<[f64; 3]> {
        self.lines.iter().map(|l| [l.a(), l.b(), l.c()]).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
    #[inline]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }
    #[inline]
    pub fn line(&self, i: usize) -> &Line {
        &self.lines[i]
    }
    #[inline]
    pub fn set_line(&mut self, i: usize, line: Line) {
        self.lines[i] = line;
    }

    /// Draw `n` lines with standard-normal `(a, b, c)`, then normalize.
    ///
    /// Draws whose `(a, b)` falls below `eps_norm` are redrawn.
    pub fn random<R: Rng>(n: usize, rng: &mut R, cfg: &GeomCfg) -> Self {
        let mut lines = Vec::with_capacity(n);
        while lines.len() < n {
            let p: Vector3<f64> = Vector3::new(
                rng.sample(StandardNormal),
                rng.sample(StandardNormal),
                rng.sample(StandardNormal),
            );
            if let Ok(l) = super::types::normalize(p, cfg) {
                lines.push(l);
            }
        }
        Self { lines }
    }

    /// Add `N(0, σ²)` noise to every parameter of every line, then re-normalize.
    ///
    /// A line whose perturbed `(a, b)` degenerates keeps its previous value; the
    /// number of such rejected updates is returned.
    pub fn perturb<R: Rng>(&mut self, sigma: f64, rng: &mut R, cfg: &GeomCfg) -> usize {
        let mut rejected = 0;
        for line in &mut self.lines {
            let delta = Vector3::new(
                rng.sample::<f64, _>(StandardNormal) * sigma,
                rng.sample::<f64, _>(StandardNormal) * sigma,
                rng.sample::<f64, _>(StandardNormal) * sigma,
            );
            match line.perturbed(delta, cfg) {
                Ok(l) => *line = l,
                Err(_) => rejected += 1,
            }
        }
        rejected
    }

    /// Apply a permutation: line `i` of the result is line `perm[i]` of `self`.
    pub fn permuted(&self, perm: &[usize]) -> Self {
        debug_assert_eq!(perm.len(), self.lines.len());
        Self {
            lines: perm.iter().map(|&p| self.lines[p]).collect(),
        }
    }

    /// Line parameters as an `N×3` matrix (rows `(a, b, c)`), for batched evaluation.
    pub fn param_matrix(&self) -> MatrixXx3<f64> {
        MatrixXx3::from_fn(self.lines.len(), |r, c| self.lines[r].params()[c])
    }

    /// Evaluate every line at three points given as homogeneous columns `(x, y, 1)`.
    ///
    /// Row `m`, column `v` holds the value of line `m` at point `v`.
    #[inline]
    pub fn eval_batch(params: &MatrixXx3<f64>, verts_h: &Matrix3<f64>) -> MatrixXx3<f64> {
        params * verts_h
    }
}
