//! Line-arrangement geometry: normalization, intersections, triangles, scoring.
//!
//! Purpose
//! - Provide the numerically explicit model every search and analysis stage
//!   evaluates: unit-normal lines, pairwise intersections, candidate triangles
//!   and the "no other line crosses the interior" test that defines a Kobon
//!   triangle.
//!
//! Conventions
//! - A line is `a x + b y + c = 0` with `a² + b² = 1`; `Line` can only be built
//!   through `normalize`, so the invariant holds after every mutation.
//! - Every tolerance is a named field of `GeomCfg` and is passed explicitly.
//! - General position = no parallel pair and no concurrent triple. Violations
//!   are recorded per scan as `Degeneracy` values instead of aborting.
//!
//! Code cross-refs: `crate::energy` (objective), `crate::graph` (combinatorial graph),
//! `crate::breather` (sensitivity sweep).

mod arrangement;
pub mod canonical;
pub mod rand;
mod scan;
pub mod special;
mod types;

pub use arrangement::Arrangement;
pub use scan::{
    check_general_position, intersect, intersections, is_clear, score, score_checked, triangles,
    valid_triangles, IntersectionGrid, Triangle, TriangleScan,
};
pub use types::{normalize, score_upper_bound, Degeneracy, GeomCfg, GeomError, Line};
