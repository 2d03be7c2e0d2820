use super::*;
use crate::anneal::{SearchError, StopReason};
use crate::energy::EnergyFunction;
use crate::geom::rand::{random_arrangement, RunToken};
use crate::geom::{score, GeomCfg};
use crate::symmetry::MirroredObjective;
use std::sync::atomic::AtomicBool;

fn small_cfg() -> BasinCfg {
    BasinCfg {
        kicks: 8,
        relax_iters: 60,
        ..BasinCfg::default()
    }
}

#[test]
fn default_schedule_is_valid() {
    let cfg = BasinCfg::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.schedule.steps.len(), 3);
    assert_eq!(cfg.schedule.min_sigma(), 0.01);
}

#[test]
fn validate_rejects_bad_schedules() {
    let bad_sum = KickSchedule::new(vec![
        KickStep { sigma: 0.5, weight: 0.5 },
        KickStep { sigma: 0.1, weight: 0.4 },
    ]);
    assert!(bad_sum.validate().is_err());
    assert!(KickSchedule::new(vec![]).validate().is_err());
    let neg = KickSchedule::new(vec![KickStep { sigma: -1.0, weight: 1.0 }]);
    assert!(neg.validate().is_err());

    let f = EnergyFunction::default();
    for cfg in [
        BasinCfg { kicks: 0, ..small_cfg() },
        BasinCfg { relax_iters: 0, ..small_cfg() },
        BasinCfg { relax_tf: 0.05, ..small_cfg() },
        BasinCfg { relax_sigma: 0.0, ..small_cfg() },
    ] {
        assert!(matches!(
            BasinHopper::new(&cfg, &f).err(),
            Some(SearchError::InvalidParams { .. })
        ));
    }
}

#[test]
fn relaxation_schedules_are_checked_up_front() {
    let cfg = BasinCfg::default();
    for step in &cfg.schedule.steps {
        let relax = cfg.relax_cfg(step.sigma);
        assert_eq!(relax.t0, step.sigma);
        assert!(relax.validate().is_ok());
    }
    // (tf/σ)^(1/iters) rounds to exactly 1 for an enormous budget.
    let flat = BasinCfg {
        relax_iters: u64::MAX / 2,
        ..small_cfg()
    };
    assert_eq!(flat.relax_cfg(0.5).alpha, 1.0);
    let f = EnergyFunction::default();
    match BasinHopper::new(&flat, &f).err() {
        Some(SearchError::InvalidParams { reason }) => assert!(reason.contains("relaxation")),
        other => panic!("expected InvalidParams, got {other:?}"),
    }
}

#[test]
fn history_is_monotone_and_snapshots_consistent() {
    let geom = GeomCfg::default();
    let f = EnergyFunction::default();
    let cfg = small_cfg();
    let seed = random_arrangement(6, RunToken::new(9, 0), &geom);
    let seed_score = score(&seed, &geom);
    let out = BasinHopper::new(&cfg, &f)
        .unwrap()
        .run(seed.clone(), RunToken::new(9, 0).child(1))
        .unwrap();

    assert_eq!(out.cycles, 8);
    assert_eq!(out.history.len(), 8);
    assert_eq!(out.stop, StopReason::Budget);
    assert!(out.history.windows(2).all(|w| w[0] <= w[1]));
    assert!(out.history.iter().all(|&s| s >= seed_score));
    assert_eq!(out.best_score, *out.history.last().unwrap());
    assert_eq!(out.best_score, score(&out.best, &geom));

    assert_eq!(out.accepted[0].arrangement, seed);
    assert_eq!(out.accepted[0].cycle, None);
    for snap in &out.accepted {
        assert_eq!(snap.score, score(&snap.arrangement, &geom));
    }
    let scores: Vec<usize> = out.accepted.iter().map(|s| s.score).collect();
    assert!(scores.windows(2).all(|w| w[0] <= w[1]));
    let distinct = out.accepted.iter().filter(|s| s.distinct).count();
    assert_eq!(distinct, out.distinct_variants);
}

#[test]
fn fixed_seed_is_deterministic() {
    let geom = GeomCfg::default();
    let f = EnergyFunction::default();
    let cfg = small_cfg();
    let seed = random_arrangement(5, RunToken::new(3, 1), &geom);
    let hopper = BasinHopper::new(&cfg, &f).unwrap();
    let a = hopper.run(seed.clone(), RunToken::new(3, 1)).unwrap();
    let b = hopper.run(seed, RunToken::new(3, 1)).unwrap();
    assert_eq!(a.best, b.best);
    assert_eq!(a.history, b.history);
    assert_eq!(a.accepted, b.accepted);
}

#[test]
fn cancelled_before_first_kick() {
    let geom = GeomCfg::default();
    let f = EnergyFunction::default();
    let cfg = small_cfg();
    let seed = random_arrangement(5, RunToken::new(4, 0), &geom);
    let flag = AtomicBool::new(true);
    let out = BasinHopper::new(&cfg, &f)
        .unwrap()
        .with_stop(&flag)
        .run(seed.clone(), RunToken::new(4, 0))
        .unwrap();
    assert_eq!(out.stop, StopReason::Cancelled);
    assert_eq!(out.cycles, 0);
    assert_eq!(out.best, seed);
    assert_eq!(out.accepted.len(), 1);
}

#[test]
fn mirrored_snapshots_are_expanded() {
    let geom = GeomCfg::default();
    let f = MirroredObjective::new(geom);
    let cfg = BasinCfg { kicks: 3, ..small_cfg() };
    let masters = random_arrangement(3, RunToken::new(5, 0), &geom);
    let out = BasinHopper::new(&cfg, &f)
        .unwrap()
        .run(masters, RunToken::new(5, 0))
        .unwrap();
    assert_eq!(out.best.len(), 3);
    assert!(out.accepted.iter().all(|s| s.arrangement.len() == 6));
}

#[test]
fn refine_many_keeps_order() {
    let geom = GeomCfg::default();
    let f = EnergyFunction::default();
    let cfg = BasinCfg { kicks: 2, ..small_cfg() };
    let seeds: Vec<_> = (0..3)
        .map(|i| {
            let tok = RunToken::new(21, i);
            (random_arrangement(5, tok, &geom), tok)
        })
        .collect();
    let outs = refine_many(&seeds, &cfg, &f, None).unwrap();
    assert_eq!(outs.len(), 3);
    for (out, (seed, _)) in outs.iter().zip(seeds.iter()) {
        assert_eq!(&out.accepted[0].arrangement, seed);
    }
    let two = random_arrangement(2, RunToken::new(0, 0), &geom);
    assert_eq!(
        refine_many(&[(two, RunToken::new(0, 0))], &cfg, &f, None).err(),
        Some(SearchError::TooFewLines { n: 2 })
    );
}
