use super::*;
use crate::geom::rand::{random_arrangement, RunToken};
use crate::geom::{Arrangement, GeomCfg, GeomError};
use proptest::prelude::*;
use rand::seq::SliceRandom;

fn arr(rows: &[[f64; 3]]) -> Arrangement {
    Arrangement::from_rows(rows, &GeomCfg::default()).unwrap()
}

fn four_lines() -> Arrangement {
    arr(&[
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [1.0, 1.0, -1.0],
        [1.0, 2.0, -10.0],
    ])
}

fn cycle(n: usize) -> Vec<(usize, usize)> {
    (0..n).map(|i| (i, (i + 1) % n)).collect()
}

#[test]
fn four_line_graph_by_hand() {
    let g = build_graph(&four_lines(), &GeomCfg::default()).unwrap();
    assert_eq!(g.n_vertices(), 6);
    assert_eq!(g.n_edges(), 8);
    assert_eq!(g.pairs[0], (0, 1));
    assert_eq!(g.pairs[5], (2, 3));
    let v = |i, j| g.vertex_of(i, j).unwrap().0;
    // On x = 0 the points are y = 0, 1, 5: (0,1) - (0,2) - (0,3).
    assert!(g.has_edge(v(0, 1), v(0, 2)));
    assert!(g.has_edge(v(0, 2), v(0, 3)));
    assert!(!g.has_edge(v(0, 1), v(0, 3)));
    assert!((g.points[v(0, 3)] - nalgebra::Vector2::new(0.0, 5.0)).norm() < 1e-12);
    assert_eq!(g.vertex_of(3, 0), g.vertex_of(0, 3));
    assert_eq!(g.vertex_of(1, 1), None);
    assert_eq!(g.degree_sequence().iter().sum::<usize>(), 16);
}

#[test]
fn every_line_contributes_a_path() {
    let cfg = GeomCfg::default();
    for seed in 0..5 {
        let a = random_arrangement(7, RunToken::new(seed, 0), &cfg);
        let g = build_graph(&a, &cfg).unwrap();
        assert_eq!(g.n_vertices(), 21);
        assert_eq!(g.n_edges(), 7 * 5);
        assert!((0..g.n_vertices()).all(|v| (2..=4).contains(&g.degree(v))));
    }
}

#[test]
fn degenerate_arrangements_are_reported() {
    let cfg = GeomCfg::default();
    let concurrent = arr(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]);
    assert!(matches!(
        build_graph(&concurrent, &cfg),
        Err(GraphError::NotGeneralPosition(GeomError::DegenerateConfiguration(_)))
    ));
    let parallel = arr(&[[1.0, 0.0, 0.0], [1.0, 0.0, -1.0], [0.0, 1.0, 0.0]]);
    assert!(build_graph(&parallel, &cfg).is_err());
    let two = arr(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    assert_eq!(build_graph(&two, &cfg), Err(GraphError::TooFewLines { n: 2 }));
    let msg = build_graph(&concurrent, &cfg).unwrap_err().to_string();
    assert!(msg.contains("concurrent"));
}

#[test]
fn refinement_aliases_regular_graphs() {
    let hexagon = IntersectionGraph::from_edges(6, &cycle(6));
    let triangles =
        IntersectionGraph::from_edges(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
    let cfg = WlCfg::default();
    assert_eq!(
        Fingerprint::of_graph(&hexagon, &cfg),
        Fingerprint::of_graph(&triangles, &cfg)
    );
    assert!(!is_isomorphic(&hexagon, &triangles));

    let relabeled = IntersectionGraph::from_edges(
        6,
        &[(3, 0), (0, 5), (5, 1), (1, 4), (4, 2), (2, 3)],
    );
    assert!(is_isomorphic(&hexagon, &relabeled));
}

#[test]
fn fingerprint_separates_simple_graphs() {
    let cfg = WlCfg::default();
    let path = IntersectionGraph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
    let star = IntersectionGraph::from_edges(4, &[(0, 1), (0, 2), (0, 3)]);
    assert_ne!(Fingerprint::of_graph(&path, &cfg), Fingerprint::of_graph(&star, &cfg));
    assert!(!is_isomorphic(&path, &star));

    let f = Fingerprint::scored(2, &path, &cfg);
    assert!(f.as_str().starts_with("2-"));
    assert_eq!(f.as_str().len(), 2 + 64);
    assert_eq!(f.to_string(), f.as_str());
}

#[test]
fn from_edges_ignores_loops_and_duplicates() {
    let g = IntersectionGraph::from_edges(3, &[(0, 1), (1, 0), (2, 2), (1, 2), (0, 9)]);
    assert_eq!(g.n_edges(), 2);
    assert_eq!(g.edges().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn fingerprint_invariant_under_relabeling(seed in any::<u64>(), n in 4usize..9) {
        let cfg = GeomCfg::default();
        let tok = RunToken::new(seed, 5);
        let a = random_arrangement(n, tok, &cfg);
        let g = build_graph(&a, &cfg);
        prop_assume!(g.is_ok());
        let g = g.unwrap();
        let mut perm: Vec<usize> = (0..n).collect();
        perm.shuffle(&mut tok.child(2).rng());
        let h = build_graph(&a.permuted(&perm), &cfg).unwrap();
        let wl = WlCfg::default();
        prop_assert_eq!(Fingerprint::of_graph(&g, &wl), Fingerprint::of_graph(&h, &wl));
        prop_assert!(is_isomorphic(&g, &h));
    }
}
