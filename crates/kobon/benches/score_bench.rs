//! Criterion benchmarks for the triangle scan and the annealing step.
//! Focus sizes: N in {6, 8, 10, 12}.
//! Results: by default under target/criterion; to store under data/bench, run:
//!   CARGO_TARGET_DIR=data/bench cargo bench -p kobon

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use kobon::api::{
    intersections, optimum_10, random_arrangement, score, AnnealCfg, EnergyFunction, Objective,
    RunToken,
};
use kobon::geom::GeomCfg;

fn bench_score(c: &mut Criterion) {
    let cfg = GeomCfg::default();
    let mut group = c.benchmark_group("scan");
    for &n in &[6usize, 8, 10, 12] {
        let arr = random_arrangement(n, RunToken::new(43, n as u64), &cfg);
        group.bench_with_input(BenchmarkId::new("score", n), &arr, |b, arr| {
            b.iter(|| score(arr, &cfg))
        });
        group.bench_with_input(BenchmarkId::new("intersections", n), &arr, |b, arr| {
            b.iter(|| intersections(arr, &cfg))
        });
        group.bench_with_input(BenchmarkId::new("perturb_evaluate", n), &n, |b, &n| {
            let f = EnergyFunction::default();
            let mut rng = RunToken::new(44, n as u64).rng();
            b.iter_batched(
                || random_arrangement(n, RunToken::new(45, n as u64), &cfg),
                |mut a| {
                    a.perturb(0.1, &mut rng, &cfg);
                    f.evaluate(&a)
                },
                BatchSize::SmallInput,
            )
        });
    }
    if let Ok(opt) = optimum_10(0, &cfg) {
        group.bench_function("score_optimum_10", |b| b.iter(|| score(&opt, &cfg)));
    }
    group.finish();
}

fn bench_anneal(c: &mut Criterion) {
    let mut group = c.benchmark_group("anneal");
    group.sample_size(10);
    let acfg = AnnealCfg::geometric(1.0, 1e-3, 2_000);
    let f = EnergyFunction::default();
    group.bench_function("run_n10_2k", |b| {
        b.iter(|| kobon::api::anneal_from_random(10, RunToken::new(46, 0), &acfg, &f, None))
    });
    group.finish();
}

criterion_group!(benches, bench_score, bench_anneal);
criterion_main!(benches);
