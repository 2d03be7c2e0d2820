//! Group retained arrangements into combinatorial families.
//!
//! Each entry is turned into its intersection graph and fingerprinted in
//! parallel; entries sharing a fingerprint form one `SolutionFamily`.
//! Arrangements without a graph (not in general position) are excluded with a
//! warning and listed in `Classification::excluded`; the rest of the batch
//! continues. With `exact_check`, families are further split so that every
//! member is isomorphic to its family's first member.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::geom::{score, Arrangement, GeomCfg};
use crate::graph::{build_graph, is_isomorphic, Fingerprint, GraphError, IntersectionGraph, WlCfg};

/// One arrangement to classify.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub id: usize,
    pub arrangement: Arrangement,
    pub score: usize,
}

impl Entry {
    /// Entry with the score computed from the arrangement.
    pub fn scored(id: usize, arrangement: Arrangement, cfg: &GeomCfg) -> Self {
        let score = score(&arrangement, cfg);
        Self {
            id,
            arrangement,
            score,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Fingerprinted {
    pub id: usize,
    pub score: usize,
    pub graph: IntersectionGraph,
    pub fingerprint: Fingerprint,
}

/// Entry dropped from classification.
#[derive(Clone, Debug, PartialEq)]
pub struct Excluded {
    pub id: usize,
    pub error: GraphError,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClassifyCfg {
    pub geom: GeomCfg,
    pub wl: WlCfg,
    /// Split fingerprint classes by exact isomorphism.
    pub exact_check: bool,
}

/// Arrangements sharing one fingerprint (and, with `exact_check`, one isomorphism class).
#[derive(Clone, Debug, PartialEq)]
pub struct SolutionFamily {
    pub id: usize,
    pub fingerprint: Fingerprint,
    /// Isomorphism class within the fingerprint; 0 unless split.
    pub variant: usize,
    pub score: usize,
    /// Entry ids, in input order.
    pub members: Vec<usize>,
}

impl SolutionFamily {
    #[inline]
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Classification {
    /// Largest first; ties ordered by fingerprint.
    pub families: Vec<SolutionFamily>,
    pub excluded: Vec<Excluded>,
}

impl Classification {
    #[inline]
    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Family size → number of families of that size.
    pub fn size_distribution(&self) -> BTreeMap<usize, usize> {
        let mut dist = BTreeMap::new();
        for f in &self.families {
            *dist.entry(f.size()).or_insert(0) += 1;
        }
        dist
    }

    pub fn singletons(&self) -> impl Iterator<Item = &SolutionFamily> {
        self.families.iter().filter(|f| f.size() == 1)
    }

    pub fn largest(&self) -> Option<&SolutionFamily> {
        self.families.first()
    }

    /// Family id of entry `id`.
    pub fn family_of(&self, id: usize) -> Option<usize> {
        self.families
            .iter()
            .find(|f| f.members.contains(&id))
            .map(|f| f.id)
    }

    pub fn classified_count(&self) -> usize {
        self.families.iter().map(SolutionFamily::size).sum()
    }
}

/// Graph and fingerprint for every entry; failures come back separately, both in input order.
pub fn fingerprint_batch(
    entries: &[Entry],
    cfg: &ClassifyCfg,
) -> (Vec<Fingerprinted>, Vec<Excluded>) {
    let results: Vec<Result<Fingerprinted, Excluded>> = entries
        .par_iter()
        .map(|e| match build_graph(&e.arrangement, &cfg.geom) {
            Ok(graph) => {
                let fingerprint = Fingerprint::scored(e.score, &graph, &cfg.wl);
                Ok(Fingerprinted {
                    id: e.id,
                    score: e.score,
                    graph,
                    fingerprint,
                })
            }
            Err(error) => Err(Excluded { id: e.id, error }),
        })
        .collect();
    let mut ok = Vec::with_capacity(results.len());
    let mut excluded = Vec::new();
    for r in results {
        match r {
            Ok(f) => ok.push(f),
            Err(x) => {
                tracing::warn!(
                    id = x.id,
                    error = %x.error,
                    "arrangement excluded from classification"
                );
                excluded.push(x);
            }
        }
    }
    (ok, excluded)
}

/// Split members (indices into `items`) into isomorphism classes.
fn split_exact(items: &[Fingerprinted], members: &[usize]) -> Vec<Vec<usize>> {
    let mut classes: Vec<Vec<usize>> = Vec::new();
    for &m in members {
        let home = classes
            .iter_mut()
            .find(|c| is_isomorphic(&items[c[0]].graph, &items[m].graph));
        match home {
            Some(c) => c.push(m),
            None => classes.push(vec![m]),
        }
    }
    classes
}

/// Fingerprint and group `entries`.
pub fn classify(entries: &[Entry], cfg: &ClassifyCfg) -> Classification {
    let (items, excluded) = fingerprint_batch(entries, cfg);

    let mut groups: BTreeMap<&Fingerprint, Vec<usize>> = BTreeMap::new();
    for (k, it) in items.iter().enumerate() {
        groups.entry(&it.fingerprint).or_default().push(k);
    }

    let mut families = Vec::with_capacity(groups.len());
    for (fp, members) in groups {
        let classes = if cfg.exact_check {
            split_exact(&items, &members)
        } else {
            vec![members]
        };
        if classes.len() > 1 {
            tracing::debug!(
                fingerprint = %fp,
                classes = classes.len(),
                "fingerprint collision split"
            );
        }
        for (variant, class) in classes.into_iter().enumerate() {
            families.push(SolutionFamily {
                id: 0,
                fingerprint: fp.clone(),
                variant,
                score: items[class[0]].score,
                members: class.iter().map(|&k| items[k].id).collect(),
            });
        }
    }
    families.sort_by(|x, y| {
        y.size()
            .cmp(&x.size())
            .then_with(|| x.fingerprint.cmp(&y.fingerprint))
            .then_with(|| x.variant.cmp(&y.variant))
    });
    for (id, f) in families.iter_mut().enumerate() {
        f.id = id;
    }

    let out = Classification { families, excluded };
    tracing::info!(
        entries = entries.len(),
        families = out.family_count(),
        singletons = out.singletons().count(),
        largest = out.largest().map_or(0, SolutionFamily::size),
        excluded = out.excluded.len(),
        "classification finished"
    );
    out
}

/// Score, fingerprint and group bare arrangements (ids are positions).
pub fn classify_arrangements(arrs: &[Arrangement], cfg: &ClassifyCfg) -> Classification {
    let entries: Vec<Entry> = arrs
        .iter()
        .enumerate()
        .map(|(id, a)| Entry::scored(id, a.clone(), &cfg.geom))
        .collect();
    classify(&entries, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::rand::{random_arrangement, RunToken};
    use crate::geom::special::{optima_10, OPTIMUM_SCORE_10};

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

    fn concurrent() -> Arrangement {
        arr(&[
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 2.0, -10.0],
        ])
    }

    #[test]
    fn groups_relabelings_and_reports_exclusions() {
        let base = four_lines();
        let batch = vec![
            base.clone(),
            base.permuted(&[3, 1, 0, 2]),
            concurrent(),
            base.permuted(&[2, 3, 1, 0]),
        ];
        let c = classify_arrangements(&batch, &ClassifyCfg::default());
        assert_eq!(c.excluded.len(), 1);
        assert_eq!(c.excluded[0].id, 2);
        assert_eq!(c.family_count(), 1);
        assert_eq!(c.classified_count(), 3);
        let fam = c.largest().unwrap();
        assert_eq!(fam.members, vec![0, 1, 3]);
        assert_eq!(fam.score, 2);
        assert!(fam.fingerprint.as_str().starts_with("2-"));
        assert_eq!(c.family_of(3), Some(0));
        assert_eq!(c.family_of(2), None);
        assert_eq!(c.singletons().count(), 0);
    }

    #[test]
    fn different_scores_never_share_a_family() {
        let cfg = ClassifyCfg::default();
        let a = four_lines();
        let entries = vec![
            Entry { id: 0, arrangement: a.clone(), score: 2 },
            Entry { id: 1, arrangement: a, score: 1 },
        ];
        let c = classify(&entries, &cfg);
        assert_eq!(c.family_count(), 2);
        assert_eq!(c.size_distribution().get(&1), Some(&2));
    }

    #[test]
    fn exact_check_keeps_isomorphic_members_together() {
        let geom = GeomCfg::default();
        let mut batch = Vec::new();
        for seed in 0..4 {
            let a = random_arrangement(6, RunToken::new(seed, 0), &geom);
            batch.push(a.permuted(&[5, 4, 3, 2, 1, 0]));
            batch.push(a);
        }
        let loose = classify_arrangements(&batch, &ClassifyCfg::default());
        let strict = classify_arrangements(
            &batch,
            &ClassifyCfg {
                exact_check: true,
                ..ClassifyCfg::default()
            },
        );
        assert!(strict.family_count() >= loose.family_count());
        assert!(strict.families.iter().all(|f| f.size() % 2 == 0));
        let sizes: usize = strict.size_distribution().iter().map(|(s, n)| s * n).sum();
        assert_eq!(sizes, 8);
        assert!(strict.families.windows(2).all(|w| w[0].size() >= w[1].size()));
    }

    #[test]
    fn equal_score_optima_form_several_families() {
        let cfg = ClassifyCfg::default();
        let optima = optima_10(&cfg.geom).unwrap();
        let c = classify_arrangements(&optima, &cfg);
        assert!(c.excluded.is_empty());
        assert!(c.families.iter().all(|f| f.score == OPTIMUM_SCORE_10));
        // One score, several combinatorial types: no family holds every optimum.
        assert_eq!(c.family_count(), 4);
        assert!(c.families.iter().all(|f| f.size() < optima.len()));
        let fam = c.largest().unwrap();
        assert_eq!(fam.members, vec![0, 1]);
        assert_eq!(c.size_distribution(), BTreeMap::from([(1, 3), (2, 1)]));
        let ids: Vec<usize> = c.singletons().flat_map(|f| f.members.clone()).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|&id| id >= 2));

        // The shared fingerprint is a genuine isomorphism, not a collision.
        let exact = classify_arrangements(&optima, &ClassifyCfg { exact_check: true, ..cfg });
        assert_eq!(exact.family_count(), 4);
        assert_eq!(exact.largest().unwrap().members, vec![0, 1]);
    }
}
