//! Criterion benchmarks for integration steps and short runs.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use drift_bench::{reference_profile, reference_simulation};

const YEAR: f64 = drift_core::Constants::CGS.year;

fn bench_single_step(c: &mut Criterion) {
    let mut sim = reference_simulation(&reference_profile(), vec![YEAR]).unwrap();
    // First run writes snapshot 0 and takes the first step.
    sim.run().unwrap();

    c.bench_function("step_100x120", |b| {
        b.iter(|| {
            let next = sim.time() + YEAR;
            sim.schedule_snapshots(&[next]).unwrap();
            let summary = sim.run().unwrap();
            black_box(&summary);
        });
    });
}

fn bench_short_run(c: &mut Criterion) {
    let times: Vec<f64> = (1..=10).map(|i| i as f64 * 10.0 * YEAR).collect();
    c.bench_function("run_10_snapshots_100x120", |b| {
        b.iter(|| {
            let mut sim = reference_simulation(&reference_profile(), times.clone()).unwrap();
            let summary = sim.run().unwrap();
            black_box(&summary);
        });
    });
}

criterion_group!(benches, bench_single_step, bench_short_run);
criterion_main!(benches);
