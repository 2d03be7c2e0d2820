//! Parameter-space canonical form for comparing arrangements geometrically.
//!
//! Sign convention: the first nonzero component of `(a, b)` is positive.
//! Lines are then sorted lexicographically by `(a, b, c)`. Two arrangements
//! that differ only in line order or line sign map to the same form.

use std::cmp::Ordering;

use super::arrangement::Arrangement;
use super::types::Line;

const SIGN_EPS: f64 = 1e-9;

/// Line with the sign convention applied.
#[inline]
pub fn sign_canonical(line: &Line) -> Line {
    let a = line.a();
    if a < -SIGN_EPS || (a.abs() < SIGN_EPS && line.b() < -SIGN_EPS) {
        line.flipped()
    } else {
        *line
    }
}

/// Canonical rows: sign convention plus lexicographic sort.
pub fn canonical_rows(arr: &Arrangement) -> Vec<[f64; 3]> {
    let mut rows: Vec<[f64; 3]> = arr
        .lines()
        .iter()
        .map(|l| {
            let s = sign_canonical(l);
            [s.a(), s.b(), s.c()]
        })
        .collect();
    rows.sort_by(|x, y| {
        x.iter()
            .zip(y.iter())
            .map(|(p, q)| p.partial_cmp(q).unwrap_or(Ordering::Equal))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

/// Euclidean (Frobenius) distance between canonical forms.
///
/// `f64::INFINITY` when the line counts differ.
pub fn geometric_distance(x: &Arrangement, y: &Arrangement) -> f64 {
    if x.len() != y.len() {
        return f64::INFINITY;
    }
    canonical_rows(x)
        .iter()
        .zip(canonical_rows(y).iter())
        .map(|(p, q)| {
            p.iter()
                .zip(q.iter())
                .map(|(u, v)| (u - v) * (u - v))
                .sum::<f64>()
        })
        .sum::<f64>()
        .sqrt()
}

/// True if `candidate` is farther than `threshold` from every arrangement in `known`.
pub fn is_distinct(candidate: &Arrangement, known: &[Arrangement], threshold: f64) -> bool {
    known
        .iter()
        .all(|k| geometric_distance(candidate, k) >= threshold)
}
