//! Breather scan: score sensitivity of a fixed arrangement to a radial scaling.
//!
//! Lines are split by distance from the origin into an inner core (smallest
//! `|c|`) and an outer shell. The inner offsets are multiplied by `k` over a
//! fixed grid and each scaled arrangement is scored; no search is run. The
//! resulting score-vs-`k` curve sizes the basin of the optimum at `k = 1`.

use rayon::prelude::*;

use crate::anneal::SearchError;
use crate::geom::{score, Arrangement, GeomCfg};

/// Largest sweep grid `validate` accepts.
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// Sweep grid and partition size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreatherCfg {
    pub k_min: f64,
    pub k_max: f64,
    pub step: f64,
    /// Size of the inner core; `None` means half the lines.
    pub inner: Option<usize>,
    pub geom: GeomCfg,
}

impl Default for BreatherCfg {
    fn default() -> Self {
        Self {
            k_min: 0.8,
            k_max: 1.2,
            step: 0.0005,
            inner: None,
            geom: GeomCfg::default(),
        }
    }
}

impl BreatherCfg {
    pub fn validate(&self) -> Result<(), SearchError> {
        if !(self.k_min.is_finite() && self.k_max.is_finite() && self.k_min < self.k_max) {
            return Err(SearchError::invalid("k_min < k_max required"));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(SearchError::invalid("step must be finite and > 0"));
        }
        let intervals = self.intervals();
        if !(intervals.is_finite() && intervals < MAX_GRID_POINTS as f64) {
            return Err(SearchError::invalid(format!(
                "grid would exceed {MAX_GRID_POINTS} points (range {}..{}, step {:e})",
                self.k_min, self.k_max, self.step
            )));
        }
        Ok(())
    }

    #[inline]
    fn intervals(&self) -> f64 {
        ((self.k_max - self.k_min) / self.step + 1e-9).floor()
    }

    /// Grid `k_min, k_min + step, …, ≤ k_max`; points within rounding of 1 are snapped to 1.
    ///
    /// At most `MAX_GRID_POINTS` points; empty for parameters `validate` rejects.
    pub fn grid(&self) -> Vec<f64> {
        let intervals = self.intervals();
        if !(intervals >= 0.0 && intervals < MAX_GRID_POINTS as f64) {
            return Vec::new();
        }
        let count = intervals as usize + 1;
        (0..count)
            .map(|i| {
                let k = self.k_min + i as f64 * self.step;
                if (k - 1.0).abs() < self.step * 1e-6 {
                    1.0
                } else {
                    k
                }
            })
            .collect()
    }
}

/// `(inner, outer)` line indices, by ascending `|c|` (ties by index); both sorted.
pub fn partition_by_offset(arr: &Arrangement, inner: usize) -> (Vec<usize>, Vec<usize>) {
    let mut idx: Vec<usize> = (0..arr.len()).collect();
    idx.sort_by(|&i, &j| {
        arr.line(i)
            .offset()
            .total_cmp(&arr.line(j).offset())
            .then(i.cmp(&j))
    });
    let cut = inner.min(idx.len());
    let mut core = idx[..cut].to_vec();
    let mut shell = idx[cut..].to_vec();
    core.sort_unstable();
    shell.sort_unstable();
    (core, shell)
}

/// `arr` with the offsets of lines `which` multiplied by `k`.
pub fn scaled(arr: &Arrangement, which: &[usize], k: f64) -> Arrangement {
    let mut out = arr.clone();
    for &i in which {
        out.set_line(i, arr.line(i).with_scaled_offset(k));
    }
    out
}

/// Score as a function of the inner scaling factor.
#[derive(Clone, Debug, PartialEq)]
pub struct BreatherCurve {
    pub inner: Vec<usize>,
    pub outer: Vec<usize>,
    pub step: f64,
    /// `(k, score)` in increasing `k`.
    pub points: Vec<(f64, usize)>,
    pub base_score: usize,
}

impl BreatherCurve {
    fn nearest(&self, k: f64) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .min_by(|x, y| (x.1 .0 - k).abs().total_cmp(&(y.1 .0 - k).abs()))
            .map(|(i, _)| i)
    }

    /// Score at the grid point within half a step of `k`.
    pub fn score_at(&self, k: f64) -> Option<usize> {
        let i = self.nearest(k)?;
        let (pk, s) = self.points[i];
        ((pk - k).abs() <= 0.5 * self.step).then_some(s)
    }

    /// Highest score; ties go to the point closest to `k = 1`.
    pub fn peak(&self) -> Option<(f64, usize)> {
        self.points.iter().copied().max_by(|x, y| {
            x.1.cmp(&y.1)
                .then_with(|| (y.0 - 1.0).abs().total_cmp(&(x.0 - 1.0).abs()))
        })
    }

    /// Width in `k` of the contiguous run around `k = 1` with score ≥ `threshold`.
    ///
    /// 0 if the point nearest `k = 1` is itself below the threshold.
    pub fn width_above(&self, threshold: f64) -> f64 {
        let Some(c) = self.nearest(1.0) else {
            return 0.0;
        };
        let above = |i: usize| self.points[i].1 as f64 >= threshold;
        if !above(c) {
            return 0.0;
        }
        let mut lo = c;
        while lo > 0 && above(lo - 1) {
            lo -= 1;
        }
        let mut hi = c;
        while hi + 1 < self.points.len() && above(hi + 1) {
            hi += 1;
        }
        self.points[hi].0 - self.points[lo].0
    }

    /// Full width at half the score at `k = 1`.
    pub fn fwhm(&self) -> f64 {
        match self.nearest(1.0) {
            Some(c) => self.width_above(self.points[c].1 as f64 / 2.0),
            None => 0.0,
        }
    }
}

/// Sweep the inner-core scaling of `arr` over `cfg.grid()`.
pub fn scan(arr: &Arrangement, cfg: &BreatherCfg) -> Result<BreatherCurve, SearchError> {
    cfg.validate()?;
    let n = arr.len();
    if n < 3 {
        return Err(SearchError::TooFewLines { n });
    }
    let inner = cfg.inner.unwrap_or(n / 2);
    if inner == 0 || inner > n {
        return Err(SearchError::invalid(format!(
            "inner core size must lie in 1..={n}, got {inner}"
        )));
    }
    let grid = cfg.grid();
    if grid.is_empty() {
        return Err(SearchError::invalid("empty sweep grid"));
    }
    let (core, shell) = partition_by_offset(arr, inner);
    let points: Vec<(f64, usize)> = grid
        .into_par_iter()
        .map(|k| (k, score(&scaled(arr, &core, k), &cfg.geom)))
        .collect();
    let base_score = score(arr, &cfg.geom);
    let curve = BreatherCurve {
        inner: core,
        outer: shell,
        step: cfg.step,
        points,
        base_score,
    };
    tracing::info!(
        lines = n,
        inner,
        points = curve.points.len(),
        base_score,
        fwhm = curve.fwhm(),
        "breather scan finished"
    );
    Ok(curve)
}
