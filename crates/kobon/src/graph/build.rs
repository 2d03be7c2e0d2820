//! Intersection graph construction from a general-position arrangement.

use std::collections::BTreeSet;

use crate::geom::{
    check_general_position, intersections, Arrangement, Degeneracy, GeomCfg, GeomError,
};

use super::types::{pair_index, GraphError, IntersectionGraph};

/// Build the intersection graph of `arr`.
///
/// Each line's `N − 1` points are ordered by their coordinate along the line
/// direction `(b, −a)` and consecutive points are joined, so each line
/// contributes a path of `N − 2` edges and the graph has `N(N − 2)` edges.
pub fn build_graph(arr: &Arrangement, cfg: &GeomCfg) -> Result<IntersectionGraph, GraphError> {
    let n = arr.len();
    if n < 3 {
        return Err(GraphError::TooFewLines { n });
    }
    check_general_position(arr, cfg).map_err(GraphError::NotGeneralPosition)?;
    let grid = intersections(arr, cfg);

    let mut pairs = Vec::with_capacity(n * (n - 1) / 2);
    let mut points = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let p = grid.get(i, j).ok_or(GraphError::NotGeneralPosition(
                GeomError::DegenerateConfiguration(Degeneracy::Parallel(i, j)),
            ))?;
            pairs.push((i, j));
            points.push(p);
        }
    }

    let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut along: Vec<(f64, usize)> = Vec::with_capacity(n - 1);
    for (l, line) in arr.lines().iter().enumerate() {
        let dir = line.direction();
        along.clear();
        for m in (0..n).filter(|&m| m != l) {
            let v = pair_index(l.min(m), l.max(m), n);
            along.push((points[v].dot(&dir), v));
        }
        along.sort_by(|x, y| x.0.total_cmp(&y.0));
        for w in along.windows(2) {
            let (u, v) = (w[0].1, w[1].1);
            edges.insert((u.min(v), u.max(v)));
        }
    }

    let mut adj = vec![Vec::new(); pairs.len()];
    for &(u, v) in &edges {
        adj[u].push(v);
        adj[v].push(u);
    }
    for list in adj.iter_mut() {
        list.sort_unstable();
    }
    Ok(IntersectionGraph {
        n_lines: n,
        pairs,
        points,
        adj,
    })
}
