//! Lines in unit-normal form, tolerances, and geometry errors.
//!
//! - `GeomCfg`: one named epsilon per predicate (norm, parallelism, coincidence, sign band).
//! - `Line`: `a x + b y + c = 0` with `a² + b² = 1`; only constructible through `normalize`.
//! - `GeomError`/`Degeneracy`: what went wrong, with the offending line indices.

use nalgebra::{Vector2, Vector3};
use std::fmt;

/// Geometry configuration (tolerances).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeomCfg {
    /// Minimum pre-normalization magnitude of `(a, b)`.
    pub eps_norm: f64,
    /// Minimum `|a_i b_j − a_j b_i|` for two lines to count as intersecting.
    pub eps_parallel: f64,
    /// Minimum distance between two triangle vertices (below: concurrent lines).
    pub eps_coincide: f64,
    /// Half-width of the band around zero where a line value counts as "on the line".
    pub eps_sign: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            eps_norm: 1e-9,
            eps_parallel: 1e-10,
            eps_coincide: 1e-6,
            eps_sign: 1e-9,
        }
    }
}

/// Why an arrangement is not in general position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Degeneracy {
    /// Lines `i` and `j` are parallel within `eps_parallel`.
    Parallel(usize, usize),
    /// Lines `i`, `j`, `k` meet in one point within `eps_coincide`.
    Concurrent(usize, usize, usize),
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parallel(i, j) => write!(f, "lines {i} and {j} are parallel"),
            Self::Concurrent(i, j, k) => write!(f, "lines {i}, {j}, {k} are concurrent"),
        }
    }
}

/// Errors raised by line normalization and general-position checks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GeomError {
    /// `|(a, b)|` was below `eps_norm` before normalization.
    DegenerateLine { magnitude: f64 },
    /// The arrangement violates general position.
    DegenerateConfiguration(Degeneracy),
}

impl fmt::Display for GeomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateLine { magnitude } => {
                write!(f, "degenerate line: |(a,b)| = {magnitude:e}")
            }
            Self::DegenerateConfiguration(d) => write!(f, "degenerate configuration: {d}"),
        }
    }
}

impl std::error::Error for GeomError {}

/// Line `a x + b y + c = 0` in unit-normal form.
///
/// Invariant: `a² + b² = 1` (up to rounding). `c` is the signed distance of the
/// origin from the line, measured against the normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    a: f64,
    b: f64,
    c: f64,
}

impl Line {
    /// Normalize raw parameters; see [`normalize`].
    #[inline]
    pub fn new(a: f64, b: f64, c: f64, cfg: &GeomCfg) -> Result<Self, GeomError> {
        normalize(Vector3::new(a, b, c), cfg)
    }

    #[inline]
    pub fn a(&self) -> f64 {
        self.a
    }
    #[inline]
    pub fn b(&self) -> f64 {
        self.b
    }
    #[inline]
    pub fn c(&self) -> f64 {
        self.c
    }

    #[inline]
    pub fn params(&self) -> Vector3<f64> {
        Vector3::new(self.a, self.b, self.c)
    }

    #[inline]
    pub fn normal(&self) -> Vector2<f64> {
        Vector2::new(self.a, self.b)
    }

    /// Unit direction vector along the line (normal rotated by −90°).
    #[inline]
    pub fn direction(&self) -> Vector2<f64> {
        Vector2::new(self.b, -self.a)
    }

    /// Signed value `a x + b y + c`; equals the signed distance for unit normals.
    #[inline]
    pub fn eval(&self, p: Vector2<f64>) -> f64 {
        self.a * p.x + self.b * p.y + self.c
    }

    /// Distance of the line from the origin.
    #[inline]
    pub fn offset(&self) -> f64 {
        self.c.abs()
    }

    /// Add `delta` to `(a, b, c)` and re-normalize.
    #[inline]
    pub fn perturbed(&self, delta: Vector3<f64>, cfg: &GeomCfg) -> Result<Self, GeomError> {
        normalize(self.params() + delta, cfg)
    }

    /// Same geometric line with the offset multiplied by `k`.
    #[inline]
    pub fn with_scaled_offset(&self, k: f64) -> Self {
        Self {
            a: self.a,
            b: self.b,
            c: self.c * k,
        }
    }

    /// Mirror image across the y-axis: `(a, b, c) ↦ (−a, b, c)`.
    #[inline]
    pub fn reflected_y(&self) -> Self {
        Self {
            a: -self.a,
            b: self.b,
            c: self.c,
        }
    }

    /// Same geometric line with all parameters negated.
    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            a: -self.a,
            b: -self.b,
            c: -self.c,
        }
    }
}

/// Rescale `(a, b)` to unit length (and `c` by the same factor).
///
/// Fails with `DegenerateLine` if `|(a, b)| < eps_norm` or any parameter is not finite.
pub fn normalize(params: Vector3<f64>, cfg: &GeomCfg) -> Result<Line, GeomError> {
    let magnitude = params.x.hypot(params.y);
    if !(magnitude.is_finite() && params.z.is_finite()) || magnitude < cfg.eps_norm {
        return Err(GeomError::DegenerateLine { magnitude });
    }
    Ok(Line {
        a: params.x / magnitude,
        b: params.y / magnitude,
        c: params.z / magnitude,
    })
}

/// Upper bound `⌊N(N−2)/3⌋` on the number of Kobon triangles for `n` lines.
#[inline]
pub fn score_upper_bound(n: usize) -> usize {
    n * n.saturating_sub(2) / 3
}
