use super::*;
use crate::energy::{EnergyFunction, Objective};
use crate::geom::rand::{random_arrangement, RunToken};
use crate::geom::special::{optimum_10, OPTIMUM_SCORE_10};
use crate::geom::{score, score_upper_bound, Arrangement, GeomCfg};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

fn quick_cfg(iters: u64) -> AnnealCfg {
    AnnealCfg::geometric(1.0, 1e-3, iters)
}

#[test]
fn validate_rejects_bad_params() {
    let ok = quick_cfg(100);
    assert!(ok.validate().is_ok());
    let cases = [
        AnnealCfg { t0: 0.0, ..ok },
        AnnealCfg { t0: -1.0, ..ok },
        AnnealCfg { tf: 0.0, ..ok },
        AnnealCfg { tf: 2.0, ..ok },
        AnnealCfg { alpha: 1.0, ..ok },
        AnnealCfg { decay_every: 0, ..ok },
        AnnealCfg { sigma: 0.0, ..ok },
        AnnealCfg { max_iters: 0, ..ok },
    ];
    for c in cases {
        assert!(matches!(
            c.validate(),
            Err(SearchError::InvalidParams { .. })
        ));
    }
    assert!(AnnealCfg::geometric(1.0, 1e-3, 0).validate().is_err());
}

#[test]
fn too_few_lines_is_fatal() {
    let cfg = GeomCfg::default();
    let two = random_arrangement(2, RunToken::new(0, 0), &cfg);
    let f = EnergyFunction::default();
    let err = AnnealRunner::new(quick_cfg(10), &f, two, StdRng::seed_from_u64(0)).err();
    assert_eq!(err, Some(SearchError::TooFewLines { n: 2 }));
    let err = multistart(2, 4, 0, &quick_cfg(10), &f, None).unwrap_err();
    assert_eq!(err, SearchError::TooFewLines { n: 2 });
}

#[test]
fn metropolis_rule() {
    let mut rng = StdRng::seed_from_u64(1);
    assert!(metropolis_accept(-1.0, 0.5, &mut rng));
    assert!(metropolis_accept(0.0, 0.5, &mut rng));
    assert!(metropolis_accept(f64::NEG_INFINITY, 0.5, &mut rng));
    assert!(!metropolis_accept(f64::INFINITY, 0.5, &mut rng));
    assert!(!metropolis_accept(f64::NAN, 0.5, &mut rng));
    // Vanishing temperature: clamped exponent, never accepted, never panics.
    for _ in 0..100 {
        assert!(!metropolis_accept(1.0, 1e-300, &mut rng));
    }
}

#[test]
fn phases_advance() {
    let cfg = GeomCfg::default();
    let init = random_arrangement(5, RunToken::new(2, 0), &cfg);
    let f = EnergyFunction::default();
    let mut r =
        AnnealRunner::new(quick_cfg(20), &f, init.clone(), StdRng::seed_from_u64(2)).unwrap();
    assert_eq!(r.phase(), Phase::Initializing);
    assert_eq!(r.step(), Phase::Cooling);
    assert_eq!(r.state().best_score, score(&init, &cfg));
    assert_eq!(r.state().temperature, 1.0);
    let out = r.run();
    assert_eq!(out.iterations, 20);
}

#[test]
fn cools_below_final_temperature() {
    let cfg = GeomCfg::default();
    let init = random_arrangement(5, RunToken::new(3, 0), &cfg);
    let f = EnergyFunction::default();
    let acfg = AnnealCfg {
        t0: 1.0,
        tf: 0.1,
        alpha: 0.5,
        decay_every: 1,
        max_iters: 1_000,
        ..AnnealCfg::default()
    };
    let out = AnnealRunner::new(acfg, &f, init, StdRng::seed_from_u64(3))
        .unwrap()
        .run();
    assert_eq!(out.stop, StopReason::Cooled);
    assert_eq!(out.iterations, 4);
    assert!(out.final_temperature < 0.1);
}

#[test]
fn budget_and_decay_interval() {
    let cfg = GeomCfg::default();
    let init = random_arrangement(5, RunToken::new(4, 0), &cfg);
    let f = EnergyFunction::default();
    let acfg = AnnealCfg {
        alpha: 0.9,
        decay_every: 10,
        max_iters: 25,
        tf: 1e-6,
        ..AnnealCfg::default()
    };
    let out = AnnealRunner::new(acfg, &f, init, StdRng::seed_from_u64(4))
        .unwrap()
        .run();
    assert_eq!(out.stop, StopReason::Budget);
    assert_eq!(out.iterations, 25);
    assert!((out.final_temperature - 0.81).abs() < 1e-12);
}

#[test]
fn cancellation_and_deadline_return_snapshot() {
    let cfg = GeomCfg::default();
    let init = random_arrangement(5, RunToken::new(5, 0), &cfg);
    let f = EnergyFunction::default();
    let flag = AtomicBool::new(true);
    let out = AnnealRunner::new(quick_cfg(1_000), &f, init.clone(), StdRng::seed_from_u64(5))
        .unwrap()
        .with_stop(&flag)
        .run();
    assert_eq!(out.stop, StopReason::Cancelled);
    assert_eq!(out.iterations, 0);
    assert_eq!(out.best, init);

    let acfg = AnnealCfg {
        deadline: Some(Duration::ZERO),
        ..quick_cfg(1_000)
    };
    let out = AnnealRunner::new(acfg, &f, init, StdRng::seed_from_u64(5))
        .unwrap()
        .run();
    assert_eq!(out.stop, StopReason::Deadline);
}

#[test]
fn best_is_consistent_and_bounded() {
    let cfg = GeomCfg::default();
    let f = EnergyFunction::default();
    let init = random_arrangement(6, RunToken::new(6, 0), &cfg);
    let start = score(&init, &cfg);
    let out = AnnealRunner::new(quick_cfg(400), &f, init, StdRng::seed_from_u64(6))
        .unwrap()
        .run();
    assert!(out.best_score >= start);
    assert_eq!(out.best_score, score(&out.best, &cfg));
    assert!(out.best_score <= score_upper_bound(6));
    assert!(out.lowest_energy <= -(start as f64));
    for l in out.best.lines() {
        assert!((l.normal().norm() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn fixed_seed_is_deterministic() {
    let f = EnergyFunction::default();
    let cfg = quick_cfg(300);
    let a = anneal_from_random(6, RunToken::new(77, 3), &cfg, &f, None).unwrap();
    let b = anneal_from_random(6, RunToken::new(77, 3), &cfg, &f, None).unwrap();
    assert_eq!(a.best, b.best);
    assert_eq!(a.best_score, b.best_score);
    assert_eq!(a.accepted, b.accepted);
}

#[test]
fn multistart_joins_in_order_and_repeats() {
    let f = EnergyFunction::default();
    let cfg = quick_cfg(150);
    let r1 = multistart(5, 4, 11, &cfg, &f, None).unwrap();
    let r2 = multistart(5, 4, 11, &cfg, &f, None).unwrap();
    assert_eq!(r1.len(), 4);
    for (k, (x, y)) in r1.iter().zip(r2.iter()).enumerate() {
        assert_eq!(x.index, k as u64);
        assert_eq!(x.outcome.best, y.outcome.best);
    }
    let best = best_run(&r1).unwrap();
    assert!(r1.iter().all(|r| r.outcome.best_score <= best.outcome.best_score));
    assert!(multistart(5, 0, 11, &cfg, &f, None).is_err());
}

#[test]
fn objective_is_object_safe() {
    let f: &dyn Objective = &EnergyFunction::default();
    let init = Arrangement::from_rows(
        &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, -1.0]],
        &GeomCfg::default(),
    )
    .unwrap();
    let out = AnnealRunner::new(quick_cfg(10), f, init, StdRng::seed_from_u64(0))
        .unwrap()
        .run();
    assert_eq!(out.best_score, 1);
}

#[test]
fn fixed_start_chains_keep_the_known_optimum() {
    let geom = GeomCfg::default();
    let start = optimum_10(0, &geom).unwrap();
    let f = EnergyFunction::new(geom);
    let cfg = quick_cfg(200);
    let runs = multistart_from(&start, 3, 5, &cfg, &f, None).unwrap();
    assert_eq!(runs.len(), 3);
    for r in &runs {
        // The start is evaluated before the first step, so best never drops below it.
        assert!(r.outcome.best_score >= OPTIMUM_SCORE_10);
        assert!(r.outcome.best_score <= score_upper_bound(10));
        assert_eq!(r.outcome.best.len(), 10);
    }
    let again = anneal_from(start.clone(), runs[1].token, &cfg, &f, None).unwrap();
    assert_eq!(again.best, runs[1].outcome.best);

    let two = Arrangement::new(start.lines()[..2].to_vec());
    let err = multistart_from(&two, 2, 5, &cfg, &f, None).unwrap_err();
    assert_eq!(err, SearchError::TooFewLines { n: 2 });
}
