//! Weisfeiler–Lehman colour refinement and graph fingerprints.
//!
//! Labels start at the vertex degree. Each round replaces a label by a digest
//! of `(label, sorted neighbour labels)`. Digests use SHA-256 so fingerprints
//! are stable across platforms, runs and builds.

use std::fmt;

use sha2::{Digest, Sha256};

use super::types::IntersectionGraph;

/// Refinement parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WlCfg {
    pub rounds: usize,
}

impl Default for WlCfg {
    fn default() -> Self {
        Self { rounds: 3 }
    }
}

#[inline]
fn truncate(digest: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(buf)
}

/// One refinement round.
fn refine_once(g: &IntersectionGraph, labels: &[u64]) -> Vec<u64> {
    let mut nbr = Vec::new();
    (0..g.n_vertices())
        .map(|v| {
            nbr.clear();
            nbr.extend(g.neighbors(v).iter().map(|&u| labels[u]));
            nbr.sort_unstable();
            let mut h = Sha256::new();
            h.update(labels[v].to_le_bytes());
            h.update((nbr.len() as u64).to_le_bytes());
            for l in &nbr {
                h.update(l.to_le_bytes());
            }
            truncate(&h.finalize())
        })
        .collect()
}

/// Vertex colours after `rounds` refinement rounds.
pub fn refine_colors(g: &IntersectionGraph, rounds: usize) -> Vec<u64> {
    let mut labels: Vec<u64> = (0..g.n_vertices()).map(|v| g.degree(v) as u64).collect();
    for _ in 0..rounds {
        labels = refine_once(g, &labels);
    }
    labels
}

fn class_count(labels: &[u64]) -> usize {
    let mut s = labels.to_vec();
    s.sort_unstable();
    s.dedup();
    s.len()
}

/// Colours refined until the partition stops splitting (at most `n` rounds).
pub fn stable_colors(g: &IntersectionGraph) -> Vec<u64> {
    let mut labels: Vec<u64> = (0..g.n_vertices()).map(|v| g.degree(v) as u64).collect();
    let mut classes = class_count(&labels);
    for _ in 0..g.n_vertices() {
        let next = refine_once(g, &labels);
        let next_classes = class_count(&next);
        labels = next;
        if next_classes == classes {
            break;
        }
        classes = next_classes;
    }
    labels
}

/// Isomorphism-invariant digest of a graph.
///
/// Isomorphic graphs always share a fingerprint. The converse fails for some
/// graphs (e.g. all regular graphs of equal size and degree collide), so a
/// family count built on fingerprints is a lower bound.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_graph(g: &IntersectionGraph, cfg: &WlCfg) -> Self {
        let mut labels = refine_colors(g, cfg.rounds);
        labels.sort_unstable();
        let mut h = Sha256::new();
        h.update((g.n_vertices() as u64).to_le_bytes());
        h.update((g.n_edges() as u64).to_le_bytes());
        for l in &labels {
            h.update(l.to_le_bytes());
        }
        Self(format!("{:x}", h.finalize()))
    }

    /// Fingerprint prefixed with the arrangement's score, `"{score}-{digest}"`.
    pub fn scored(score: usize, g: &IntersectionGraph, cfg: &WlCfg) -> Self {
        let inner = Self::of_graph(g, cfg);
        Self(format!("{score}-{}", inner.0))
    }

    /// Wrap a stored fingerprint string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
