//! Known 10-line arrangements with 25 Kobon triangles, used in tests and benchmarks.
//!
//! Purpose
//! - Give tests real optima instead of random or hand-typed arrangements.
//! - Rows are `(a, b, c)` rounded to six decimals; `Arrangement::from_rows`
//!   re-normalizes them. Every point/line distance in these arrangements is
//!   above 1e-2, far from every `GeomCfg` tolerance.
//!
//! Facts relied on by tests
//! - Each arrangement scores 25 (the bound `⌊N(N−2)/3⌋` is 26).
//! - `OPTIMA_10[0]` and `OPTIMA_10[1]` have isomorphic intersection graphs;
//!   the other three graphs are pairwise distinct and distinct from those.
//! - The inner core of `OPTIMA_10[0]` (the five lines closest to the origin)
//!   keeps 25 triangles only for `k ∈ [0.9675, 1.0635]`; the score drops to 22
//!   around `k = 0.9` and to 21 around `k = 1.15`.

use super::types::{GeomCfg, GeomError};
use super::Arrangement;

pub const OPTIMUM_SCORE_10: usize = 25;

pub const OPTIMA_10: [[[f64; 3]; 10]; 5] = [
    [
        [0.820863, 0.571125, 0.367166],
        [-0.776433, 0.630200, -1.798958],
        [0.106282, 0.994336, -8.805031],
        [0.199026, 0.979994, -2.132779],
        [-0.601244, 0.799065, -1.915869],
        [-0.627660, 0.778487, -2.843925],
        [0.733708, 0.679465, -1.681972],
        [-0.487229, 0.873274, -1.461106],
        [0.441997, -0.897017, 2.371098],
        [0.877345, -0.479861, 2.229625],
    ],
    [
        [-0.896980, 0.442071, -0.673681],
        [0.552374, -0.833596, -0.243623],
        [-0.979154, -0.203121, 1.095666],
        [0.992856, 0.119317, -2.623102],
        [-0.740626, 0.671918, 10.882877],
        [0.255858, 0.966715, -1.747617],
        [0.549573, 0.835445, -3.426369],
        [0.876199, -0.481949, -2.135072],
        [0.609783, 0.792568, -0.567604],
        [-0.029004, 0.999579, -6.544040],
    ],
    [
        [0.769024, 0.639220, 1.877534],
        [-0.169268, -0.985570, 3.430831],
        [-0.861490, 0.507774, -1.006431],
        [-0.760253, -0.649627, 0.577871],
        [0.996046, 0.088840, -3.058224],
        [0.894693, -0.446681, -0.222721],
        [0.554804, -0.831981, -0.077862],
        [0.442129, -0.896951, -2.135551],
        [-0.020213, 0.999796, -1.191996],
        [0.999657, -0.026191, -1.308567],
    ],
    [
        [0.966674, -0.256010, 2.035698],
        [-0.616831, 0.787096, -3.828045],
        [-0.167787, 0.985823, 0.937349],
        [-0.998383, -0.056847, 0.944543],
        [-0.217118, -0.976145, 15.954978],
        [-0.344351, 0.938841, -2.415431],
        [0.562393, 0.826870, -1.672992],
        [0.657701, -0.753280, 0.676485],
        [0.771870, 0.635781, 0.542749],
        [-0.979671, 0.200611, -0.246837],
    ],
    [
        [0.999938, 0.011146, -1.312585],
        [0.021502, -0.999769, -5.222289],
        [0.752114, 0.659033, 8.783980],
        [0.686275, 0.727342, 1.906298],
        [-0.281071, -0.959687, 2.165209],
        [-0.996453, 0.084152, -4.446437],
        [-0.755245, 0.655442, 7.316993],
        [-0.197343, 0.980334, 17.261152],
        [0.398940, 0.916977, 6.463319],
        [0.471950, -0.881626, 0.350020],
    ],
];

/// `OPTIMA_10[i]` as an arrangement.
pub fn optimum_10(i: usize, cfg: &GeomCfg) -> Result<Arrangement, GeomError> {
    Arrangement::from_rows(&OPTIMA_10[i], cfg)
}

/// All known 10-line optima, in table order.
pub fn optima_10(cfg: &GeomCfg) -> Result<Vec<Arrangement>, GeomError> {
    OPTIMA_10
        .iter()
        .map(|rows| Arrangement::from_rows(rows, cfg))
        .collect()
}
