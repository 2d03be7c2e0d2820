//! Curated surface for drivers (UNSTABLE).
//!
//! Important
//! - Not a stable API. It gathers what the CLI and benches use so they import
//!   from one place. Breaking changes are allowed.

// Geometry
pub use crate::geom::canonical::{canonical_rows, geometric_distance, is_distinct};
pub use crate::geom::rand::{random_arrangement, RunToken};
pub use crate::geom::special::{optima_10, optimum_10, OPTIMA_10, OPTIMUM_SCORE_10};
pub use crate::geom::{
    check_general_position, intersections, normalize, score, score_checked, score_upper_bound,
    triangles, valid_triangles, Arrangement, Degeneracy, GeomCfg, GeomError, Line, Triangle,
};
// Objectives
pub use crate::energy::{EnergyFunction, Evaluation, Objective};
pub use crate::symmetry::{
    detect_pairs, mirror, rank_symmetries, symmetrize, MirroredObjective, SymmetryKind,
    SymmetryPenalty,
};
// Search
pub use crate::anneal::{
    anneal_from, anneal_from_random, best_run, multistart, multistart_from, AnnealCfg,
    AnnealOutcome, RunResult, SearchError, StopReason,
};
pub use crate::basin::{refine_many, BasinCfg, BasinHopper, BasinOutcome, KickSchedule, Snapshot};
// Classification
pub use crate::classify::{classify, classify_arrangements, Classification, ClassifyCfg, Entry};
pub use crate::graph::{
    build_graph, is_isomorphic, Fingerprint, GraphError, IntersectionGraph, WlCfg,
};
// Sensitivity
pub use crate::breather::{scan as breather_scan, BreatherCfg, BreatherCurve};
// Pipeline
pub use crate::pipeline::{discover, Discovery, PipelineCfg, Retain};
