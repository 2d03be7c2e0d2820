//! Axial symmetry: mirrored parametrizations, soft penalties, and ranking.
//!
//! Purpose
//! - Soft symmetry: a pairing π of line indices and a weight λ, added to the
//!   energy so the search prefers (but is not forced into) mirror symmetry
//!   across the y-axis.
//! - Forced symmetry: search over M master lines; the scored arrangement is
//!   each master line followed by its reflection (2M lines).
//! - Ranking: which planar symmetry an arrangement's intersection point cloud
//!   comes closest to.
//!
//! Lines are compared sign-invariantly: `(a, b, c)` and `−(a, b, c)` are the
//! same line, so distances take the smaller of `‖u − v‖` and `‖u + v‖`.

use nalgebra::{Matrix2, Vector2};
use std::fmt;

use crate::energy::{EnergyFunction, Evaluation, Objective};
use crate::geom::canonical::sign_canonical;
use crate::geom::{intersections, normalize, Arrangement, GeomCfg, GeomError, Line};

/// Sign-invariant distance between the mirror image of `l` and `m`.
#[inline]
pub fn mirror_distance(l: &Line, m: &Line) -> f64 {
    let r = l.reflected_y().params();
    let v = m.params();
    (r - v).norm().min((r + v).norm())
}

/// Greedy pairing of each line with the line closest to its mirror image.
///
/// A line may pair with itself (a line symmetric about the y-axis).
pub fn detect_pairs(arr: &Arrangement) -> Vec<(usize, usize)> {
    let n = arr.len();
    let mut used = vec![false; n];
    let mut pairs = Vec::with_capacity(n.div_ceil(2));
    for i in 0..n {
        if used[i] {
            continue;
        }
        let best = (i..n)
            .filter(|&j| !used[j])
            .map(|j| (j, mirror_distance(arr.line(i), arr.line(j))))
            .min_by(|x, y| x.1.total_cmp(&y.1));
        if let Some((j, _)) = best {
            used[i] = true;
            used[j] = true;
            pairs.push((i, j));
        }
    }
    pairs
}

/// Soft symmetry term `λ · Σ d(reflect(L_i), L_j)²` over a fixed pairing.
#[derive(Clone, Debug, PartialEq)]
pub struct SymmetryPenalty {
    pub pairs: Vec<(usize, usize)>,
    pub weight: f64,
}

impl SymmetryPenalty {
    pub fn new(pairs: Vec<(usize, usize)>, weight: f64) -> Self {
        Self { pairs, weight }
    }

    /// Pairing detected from a (nearly symmetric) starting arrangement.
    pub fn detect(arr: &Arrangement, weight: f64) -> Self {
        Self::new(detect_pairs(arr), weight)
    }

    /// Unweighted sum of squared mirror distances.
    pub fn error(&self, arr: &Arrangement) -> f64 {
        self.pairs
            .iter()
            .map(|&(i, j)| mirror_distance(arr.line(i), arr.line(j)).powi(2))
            .sum()
    }

    #[inline]
    pub fn penalty(&self, arr: &Arrangement) -> f64 {
        self.weight * self.error(arr)
    }
}

/// Master lines followed by their reflections: `[m0, r(m0), m1, r(m1), ...]`.
pub fn mirror(master: &Arrangement) -> Arrangement {
    Arrangement::new(
        master
            .lines()
            .iter()
            .flat_map(|l| [*l, l.reflected_y()])
            .collect(),
    )
}

/// Extract master lines from a nearly symmetric arrangement.
///
/// Each line is paired with the closest mirror partner among the remaining
/// lines and the pair is averaged into one master line. If the pairing does not
/// produce `N/2` masters, the first `N/2` lines are returned unchanged.
pub fn symmetrize(arr: &Arrangement, cfg: &GeomCfg) -> Result<Arrangement, GeomError> {
    let n = arr.len();
    let lines: Vec<Line> = arr.lines().iter().map(sign_canonical).collect();
    let mut used = vec![false; n];
    let mut masters = Vec::with_capacity(n / 2);
    for i in 0..n {
        if used[i] {
            continue;
        }
        let best = ((i + 1)..n)
            .filter(|&j| !used[j])
            .map(|j| (j, mirror_distance(&lines[j], &lines[i])))
            .min_by(|x, y| x.1.total_cmp(&y.1));
        let Some((j, _)) = best else { continue };
        used[i] = true;
        used[j] = true;
        let l1 = lines[i].params();
        let mut r2 = lines[j].reflected_y().params();
        if (l1 - r2).norm() > (l1 + r2).norm() {
            r2 = -r2;
        }
        masters.push(sign_canonical(&normalize((l1 + r2) / 2.0, cfg)?));
    }
    if masters.len() != n / 2 {
        tracing::warn!(
            found = masters.len(),
            expected = n / 2,
            "symmetrize: incomplete pairing, keeping leading lines"
        );
        return Ok(Arrangement::new(arr.lines()[..n / 2].to_vec()));
    }
    Ok(Arrangement::new(masters))
}

/// Objective over master lines, scored on the mirrored arrangement.
#[derive(Clone, Debug, Default)]
pub struct MirroredObjective {
    pub inner: EnergyFunction,
}

impl MirroredObjective {
    pub fn new(cfg: GeomCfg) -> Self {
        Self {
            inner: EnergyFunction::new(cfg),
        }
    }
}

impl Objective for MirroredObjective {
    fn evaluate(&self, state: &Arrangement) -> Evaluation {
        self.inner.evaluate(&mirror(state))
    }

    fn expand(&self, state: &Arrangement) -> Arrangement {
        mirror(state)
    }

    fn expanded_len(&self, n: usize) -> usize {
        2 * n
    }
}

/// Candidate planar symmetries of an intersection point cloud.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymmetryKind {
    Rot72,
    Rot180,
    /// Reflection across the vertical axis (`x ↦ −x`).
    ReflectY,
    /// Reflection across the horizontal axis (`y ↦ −y`).
    ReflectX,
    /// Reflection across `y = x`.
    DiagPos,
    /// Reflection across `y = −x`.
    DiagNeg,
}

impl SymmetryKind {
    pub const ALL: [SymmetryKind; 6] = [
        Self::Rot72,
        Self::Rot180,
        Self::ReflectY,
        Self::ReflectX,
        Self::DiagPos,
        Self::DiagNeg,
    ];

    pub fn matrix(self) -> Matrix2<f64> {
        match self {
            Self::Rot72 => {
                let th = 2.0 * std::f64::consts::PI / 5.0;
                Matrix2::new(th.cos(), -th.sin(), th.sin(), th.cos())
            }
            Self::Rot180 => -Matrix2::identity(),
            Self::ReflectY => Matrix2::new(-1.0, 0.0, 0.0, 1.0),
            Self::ReflectX => Matrix2::new(1.0, 0.0, 0.0, -1.0),
            Self::DiagPos => Matrix2::new(0.0, 1.0, 1.0, 0.0),
            Self::DiagNeg => Matrix2::new(0.0, -1.0, -1.0, 0.0),
        }
    }
}

impl fmt::Display for SymmetryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rot72 => "rot72",
            Self::Rot180 => "rot180",
            Self::ReflectY => "reflect_y",
            Self::ReflectX => "reflect_x",
            Self::DiagPos => "diag_pos",
            Self::DiagNeg => "diag_neg",
        };
        f.write_str(s)
    }
}

/// Intersection points centred on their centroid, scaled to unit mean radius.
fn normalized_points(arr: &Arrangement, cfg: &GeomCfg) -> Vec<Vector2<f64>> {
    let grid = intersections(arr, cfg);
    let n = arr.len();
    let pts: Vec<Vector2<f64>> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .filter_map(|(i, j)| grid.get(i, j))
        .collect();
    if pts.is_empty() {
        return pts;
    }
    let centroid = pts.iter().sum::<Vector2<f64>>() / pts.len() as f64;
    let centred: Vec<Vector2<f64>> = pts.iter().map(|p| p - centroid).collect();
    let mean = centred.iter().map(|p| p.norm()).sum::<f64>() / centred.len() as f64;
    let scale = if mean < 1e-9 { 1.0 } else { mean };
    centred.into_iter().map(|p| p / scale).collect()
}

/// Mean distance from each transformed point to its nearest original point.
fn symmetry_error(points: &[Vector2<f64>], m: &Matrix2<f64>) -> f64 {
    let total: f64 = points
        .iter()
        .map(|p| {
            let q = m * p;
            points
                .iter()
                .map(|r| (q - r).norm())
                .fold(f64::INFINITY, f64::min)
        })
        .sum();
    total / points.len() as f64
}

/// Symmetry errors of `arr`, lowest (most symmetric) first.
///
/// Empty if the arrangement has no finite intersection point.
pub fn rank_symmetries(arr: &Arrangement, cfg: &GeomCfg) -> Vec<(SymmetryKind, f64)> {
    let points = normalized_points(arr, cfg);
    if points.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<(SymmetryKind, f64)> = SymmetryKind::ALL
        .iter()
        .map(|&k| (k, symmetry_error(&points, &k.matrix())))
        .collect();
    out.sort_by(|x, y| x.1.total_cmp(&y.1));
    out
}
