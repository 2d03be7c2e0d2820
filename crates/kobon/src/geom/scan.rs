//! Intersections, triangle enumeration, the interior-crossing test, and scoring.
//!
//! Complexity: `O(N³)` triples, each checked against all lines at once by one
//! `N×3 · 3×3` product (line parameters times homogeneous vertices).

use nalgebra::{Matrix3, MatrixXx3, Vector2, Vector3};

use super::arrangement::Arrangement;
use super::types::{Degeneracy, GeomCfg, GeomError, Line};

/// Pairwise intersection points; `None` on the diagonal and for parallel pairs.
#[derive(Clone, Debug)]
pub struct IntersectionGrid {
    n: usize,
    points: Vec<Option<Vector2<f64>>>,
}

impl IntersectionGrid {
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<Vector2<f64>> {
        self.points[i * self.n + j]
    }

    /// Unordered pairs `(i, j)`, `i < j`, without a finite intersection.
    pub fn parallel_pairs(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                if self.get(i, j).is_none() {
                    out.push((i, j));
                }
            }
        }
        out
    }
}

/// Intersection of two lines via the determinant `a_i b_j − a_j b_i`.
///
/// `None` if the lines are parallel within `eps_parallel`.
#[inline]
pub fn intersect(li: &Line, lj: &Line, cfg: &GeomCfg) -> Option<Vector2<f64>> {
    let det = li.a() * lj.b() - lj.a() * li.b();
    if det.abs() < cfg.eps_parallel {
        return None;
    }
    let x = (li.b() * lj.c() - lj.b() * li.c()) / det;
    let y = (lj.a() * li.c() - li.a() * lj.c()) / det;
    Some(Vector2::new(x, y))
}

/// All pairwise intersections of `arr`.
pub fn intersections(arr: &Arrangement, cfg: &GeomCfg) -> IntersectionGrid {
    let n = arr.len();
    let mut points = vec![None; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let p = intersect(arr.line(i), arr.line(j), cfg);
            points[i * n + j] = p;
            points[j * n + i] = p;
        }
    }
    IntersectionGrid { n, points }
}

/// Candidate triangle: three lines whose pairwise intersections are finite and distinct.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    /// Line indices, sorted ascending.
    pub lines: [usize; 3],
    /// `P(i,j)`, `P(j,k)`, `P(i,k)` for `lines = [i, j, k]`.
    pub vertices: [Vector2<f64>; 3],
    /// No other line crosses (or touches) the triangle.
    pub clear: bool,
}

/// Result of one full triple enumeration.
#[derive(Clone, Debug, Default)]
pub struct TriangleScan {
    pub triangles: Vec<Triangle>,
    pub degeneracies: Vec<Degeneracy>,
}

impl TriangleScan {
    /// Number of clear (Kobon) triangles.
    #[inline]
    pub fn score(&self) -> usize {
        self.triangles.iter().filter(|t| t.clear).count()
    }

    #[inline]
    pub fn is_general_position(&self) -> bool {
        self.degeneracies.is_empty()
    }

    /// First recorded degeneracy as an error.
    pub fn general_position(&self) -> Result<(), GeomError> {
        match self.degeneracies.first() {
            Some(d) => Err(GeomError::DegenerateConfiguration(*d)),
            None => Ok(()),
        }
    }

    pub fn valid(&self) -> impl Iterator<Item = &Triangle> {
        self.triangles.iter().filter(|t| t.clear)
    }
}

#[inline]
fn sorted3(t: [usize; 3]) -> [usize; 3] {
    let mut t = t;
    t.sort_unstable();
    t
}

#[inline]
fn distinct(v: &[Vector2<f64>; 3], eps: f64) -> bool {
    (v[0] - v[1]).norm() >= eps && (v[1] - v[2]).norm() >= eps && (v[0] - v[2]).norm() >= eps
}

/// Batched crossing test for a sorted triple against every other line.
fn clear_against(
    params: &MatrixXx3<f64>,
    tri: [usize; 3],
    v: &[Vector2<f64>; 3],
    eps: f64,
) -> bool {
    let verts_h = Matrix3::from_columns(&[
        Vector3::new(v[0].x, v[0].y, 1.0),
        Vector3::new(v[1].x, v[1].y, 1.0),
        Vector3::new(v[2].x, v[2].y, 1.0),
    ]);
    let evals = Arrangement::eval_batch(params, &verts_h);
    for m in 0..evals.nrows() {
        if tri.contains(&m) {
            continue;
        }
        let row = evals.row(m);
        let lo = row.min();
        let hi = row.max();
        if lo < -eps && hi > eps {
            return false;
        }
        // A vertex inside the zero band means the line runs through it.
        if row.iter().any(|x| x.abs() <= eps) {
            return false;
        }
    }
    true
}

/// Enumerate every triple, classify candidates and record degeneracies.
pub fn triangles(arr: &Arrangement, cfg: &GeomCfg) -> TriangleScan {
    let n = arr.len();
    let grid = intersections(arr, cfg);
    let params = arr.param_matrix();
    let mut scan = TriangleScan {
        triangles: Vec::new(),
        degeneracies: grid
            .parallel_pairs()
            .into_iter()
            .map(|(i, j)| Degeneracy::Parallel(i, j))
            .collect(),
    };
    for i in 0..n {
        for j in (i + 1)..n {
            let Some(pij) = grid.get(i, j) else { continue };
            for k in (j + 1)..n {
                let (Some(pjk), Some(pik)) = (grid.get(j, k), grid.get(i, k)) else {
                    continue;
                };
                let vertices = [pij, pjk, pik];
                if !distinct(&vertices, cfg.eps_coincide) {
                    scan.degeneracies.push(Degeneracy::Concurrent(i, j, k));
                    continue;
                }
                let lines = [i, j, k];
                let clear = clear_against(&params, lines, &vertices, cfg.eps_sign);
                scan.triangles.push(Triangle {
                    lines,
                    vertices,
                    clear,
                });
            }
        }
    }
    scan
}

/// Whether the triangle cut out by `tri` is a candidate that no other line crosses.
///
/// Depends only on the unordered triple.
pub fn is_clear(tri: [usize; 3], arr: &Arrangement, cfg: &GeomCfg) -> bool {
    let [i, j, k] = sorted3(tri);
    if i == j || j == k || k >= arr.len() {
        return false;
    }
    let (Some(pij), Some(pjk), Some(pik)) = (
        intersect(arr.line(i), arr.line(j), cfg),
        intersect(arr.line(j), arr.line(k), cfg),
        intersect(arr.line(i), arr.line(k), cfg),
    ) else {
        return false;
    };
    let vertices = [pij, pjk, pik];
    if !distinct(&vertices, cfg.eps_coincide) {
        return false;
    }
    clear_against(&arr.param_matrix(), [i, j, k], &vertices, cfg.eps_sign)
}

/// Number of valid (Kobon) triangles.
pub fn score(arr: &Arrangement, cfg: &GeomCfg) -> usize {
    triangles(arr, cfg).score()
}

/// Score, or the first general-position violation.
pub fn score_checked(arr: &Arrangement, cfg: &GeomCfg) -> Result<usize, GeomError> {
    let scan = triangles(arr, cfg);
    scan.general_position()?;
    Ok(scan.score())
}

/// General-position check: no parallel pairs, no concurrent triples.
pub fn check_general_position(arr: &Arrangement, cfg: &GeomCfg) -> Result<(), GeomError> {
    let grid = intersections(arr, cfg);
    if let Some(&(i, j)) = grid.parallel_pairs().first() {
        return Err(GeomError::DegenerateConfiguration(Degeneracy::Parallel(i, j)));
    }
    let n = arr.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let (Some(pij), Some(pjk), Some(pik)) =
                    (grid.get(i, j), grid.get(j, k), grid.get(i, k))
                else {
                    continue;
                };
                if !distinct(&[pij, pjk, pik], cfg.eps_coincide) {
                    return Err(GeomError::DegenerateConfiguration(Degeneracy::Concurrent(
                        i, j, k,
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Valid triangles with their vertex coordinates (the visualization query).
pub fn valid_triangles(arr: &Arrangement, cfg: &GeomCfg) -> Vec<Triangle> {
    triangles(arr, cfg).valid().copied().collect()
}
