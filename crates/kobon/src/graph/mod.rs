//! Combinatorial view of an arrangement: intersection graph, colour refinement,
//! exact isomorphism.
//!
//! Purpose
//! - Turn a scored arrangement into a simple graph whose vertices are the
//!   `C(N, 2)` intersection points and whose edges join points adjacent along
//!   a shared line.
//! - Fingerprint that graph with Weisfeiler–Lehman refinement so that
//!   combinatorially equivalent optima collapse into one family.
//!
//! Limits
//! - Refinement is not a complete isomorphism test; distinct graphs may share
//!   a fingerprint. `is_isomorphic` is the exact (backtracking) fallback and is
//!   tractable at the sizes searched here (≤ 45 vertices).
//! - Arrangements outside general position have no graph; `build_graph`
//!   returns `GraphError::NotGeneralPosition` and callers report them.
//!
//! Code cross-refs: `crate::geom::{intersections, check_general_position}`,
//! `crate::classify` (grouping by fingerprint).

mod build;
mod iso;
mod types;
mod wl;

pub use build::build_graph;
pub use iso::is_isomorphic;
pub use types::{GraphError, IntersectionGraph, VertexId};
pub use wl::{refine_colors, stable_colors, Fingerprint, WlCfg};

#[cfg(test)]
mod tests;
