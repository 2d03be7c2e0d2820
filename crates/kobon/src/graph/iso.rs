//! Exact isomorphism test by colour-constrained backtracking.
//!
//! Intended for graphs of at most a few dozen vertices (N ≤ 10 lines gives
//! 45 vertices). Candidates for each vertex are restricted to the same stable
//! colour class; adjacency with every already-mapped vertex must agree.

use super::types::IntersectionGraph;
use super::wl::stable_colors;

/// Search order: repeatedly take the vertex with the most already-ordered
/// neighbours, breaking ties by smaller colour class, then by id.
fn search_order(g: &IntersectionGraph, class_size: &[usize]) -> Vec<usize> {
    let n = g.n_vertices();
    let mut placed = vec![false; n];
    let mut links = vec![0usize; n];
    let mut order = Vec::with_capacity(n);
    for _ in 0..n {
        let next = (0..n)
            .filter(|&v| !placed[v])
            .min_by_key(|&v| (std::cmp::Reverse(links[v]), class_size[v], v));
        let Some(v) = next else { break };
        placed[v] = true;
        order.push(v);
        for &u in g.neighbors(v) {
            links[u] += 1;
        }
    }
    order
}

struct Matcher<'a> {
    g: &'a IntersectionGraph,
    h: &'a IntersectionGraph,
    cg: &'a [u64],
    ch: &'a [u64],
    order: Vec<usize>,
    map: Vec<Option<usize>>,
    used: Vec<bool>,
}

impl Matcher<'_> {
    fn consistent(&self, v: usize, w: usize) -> bool {
        if self.cg[v] != self.ch[w] {
            return false;
        }
        self.order.iter().all(|&u| match self.map[u] {
            Some(mu) => self.g.has_edge(u, v) == self.h.has_edge(mu, w),
            None => true,
        })
    }

    fn extend(&mut self, depth: usize) -> bool {
        if depth == self.order.len() {
            return true;
        }
        let v = self.order[depth];
        for w in 0..self.h.n_vertices() {
            if self.used[w] || !self.consistent(v, w) {
                continue;
            }
            self.map[v] = Some(w);
            self.used[w] = true;
            if self.extend(depth + 1) {
                return true;
            }
            self.map[v] = None;
            self.used[w] = false;
        }
        false
    }
}

/// True iff `g` and `h` are isomorphic.
pub fn is_isomorphic(g: &IntersectionGraph, h: &IntersectionGraph) -> bool {
    if g.n_vertices() != h.n_vertices() || g.n_edges() != h.n_edges() {
        return false;
    }
    if g.degree_sequence() != h.degree_sequence() {
        return false;
    }
    // Refinement is isomorphism-invariant: corresponding vertices share colours.
    let cg = stable_colors(g);
    let ch = stable_colors(h);
    let (mut sg, mut sh) = (cg.clone(), ch.clone());
    sg.sort_unstable();
    sh.sort_unstable();
    if sg != sh {
        return false;
    }
    let class_size: Vec<usize> = cg
        .iter()
        .map(|c| sg.iter().filter(|&&x| x == *c).count())
        .collect();
    let order = search_order(g, &class_size);
    let n = g.n_vertices();
    let mut m = Matcher {
        g,
        h,
        cg: &cg,
        ch: &ch,
        order,
        map: vec![None; n],
        used: vec![false; n],
    };
    m.extend(0)
}
