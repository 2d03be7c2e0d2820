//! Kobon triangle search: geometry, stochastic optimization, and classification
//! of line arrangements.
//!
//! Layout
//! - `geom`: unit-normal lines, intersections, triangle validity, scoring.
//! - `energy`, `symmetry`: search objectives (plain, soft-symmetric, mirrored).
//! - `anneal`, `basin`: simulated annealing and basin hopping.
//! - `graph`, `classify`: intersection graphs, WL fingerprints, families.
//! - `breather`: one-parameter sensitivity sweep around an optimum.
//! - `pipeline`: the full discovery flow.
//!
//! The crate does no I/O; record formats live in the CLI.

pub mod anneal;
pub mod api;
pub mod basin;
pub mod breather;
pub mod classify;
pub mod energy;
pub mod geom;
pub mod graph;
pub mod pipeline;
pub mod symmetry;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use geom::{Arrangement, GeomCfg, Line};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::anneal::{AnnealCfg, SearchError};
    pub use crate::basin::BasinCfg;
    pub use crate::energy::{EnergyFunction, Objective};
    pub use crate::geom::rand::RunToken;
    pub use crate::geom::{score, valid_triangles, Arrangement, GeomCfg, Line};
    pub use crate::graph::{Fingerprint, WlCfg};
    pub use crate::pipeline::{discover, PipelineCfg};
}
