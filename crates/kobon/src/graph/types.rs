//! Data types for the intersection graph.

use std::fmt;

use nalgebra::Vector2;

use crate::geom::GeomError;

/// Why an arrangement has no intersection graph.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphError {
    TooFewLines { n: usize },
    NotGeneralPosition(GeomError),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewLines { n } => write!(f, "need at least 3 lines, got {n}"),
            Self::NotGeneralPosition(e) => write!(f, "not in general position: {e}"),
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotGeneralPosition(e) => Some(e),
            Self::TooFewLines { .. } => None,
        }
    }
}

/// Vertex id: index into `IntersectionGraph::pairs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub usize);

/// Simple undirected graph. Built from an arrangement, vertex `v` is the
/// intersection of lines `pairs[v]` (`i < j`) at `points[v]`; vertices are
/// numbered in lexicographic pair order.
#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionGraph {
    pub n_lines: usize,
    pub pairs: Vec<(usize, usize)>,
    pub points: Vec<Vector2<f64>>,
    /// Sorted neighbour lists.
    pub adj: Vec<Vec<usize>>,
}

impl IntersectionGraph {
    /// Abstract graph from an edge list (no geometry attached).
    pub fn from_edges(n_vertices: usize, edges: &[(usize, usize)]) -> Self {
        let mut adj = vec![Vec::new(); n_vertices];
        for &(u, v) in edges {
            if u == v || u >= n_vertices || v >= n_vertices {
                continue;
            }
            adj[u].push(v);
            adj[v].push(u);
        }
        for list in adj.iter_mut() {
            list.sort_unstable();
            list.dedup();
        }
        Self {
            n_lines: 0,
            pairs: Vec::new(),
            points: Vec::new(),
            adj,
        }
    }

    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.adj.len()
    }

    pub fn n_edges(&self) -> usize {
        self.adj.iter().map(Vec::len).sum::<usize>() / 2
    }

    #[inline]
    pub fn degree(&self, v: usize) -> usize {
        self.adj[v].len()
    }

    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.adj[v]
    }

    #[inline]
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adj[u].binary_search(&v).is_ok()
    }

    /// Edges `(u, v)` with `u < v`, in order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adj
            .iter()
            .enumerate()
            .flat_map(|(u, list)| list.iter().filter(move |&&v| u < v).map(move |&v| (u, v)))
    }

    /// Sorted degree sequence.
    pub fn degree_sequence(&self) -> Vec<usize> {
        let mut d: Vec<usize> = self.adj.iter().map(Vec::len).collect();
        d.sort_unstable();
        d
    }

    /// Vertex of the intersection of lines `i` and `j`.
    pub fn vertex_of(&self, i: usize, j: usize) -> Option<VertexId> {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        if i == j || j >= self.n_lines {
            return None;
        }
        Some(VertexId(pair_index(i, j, self.n_lines)))
    }
}

/// Index of pair `(i, j)`, `i < j < n`, in lexicographic enumeration.
#[inline]
pub(crate) fn pair_index(i: usize, j: usize, n: usize) -> usize {
    i * n - i * (i + 1) / 2 + (j - i - 1)
}
