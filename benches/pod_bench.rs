//! Benchmarks for the POD decomposition and the windowing hot paths.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use pod_surrogate_rs::{compute_pod, window_series, CoeffSeries, SnapshotSet, Truncation};

fn snapshots(n_grids: usize, n_dof: usize, n_time: usize) -> SnapshotSet {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let grids = (0..n_grids)
        .map(|_| DMatrix::from_fn(n_dof, n_time, |_, _| rng.gen::<f64>()))
        .collect();
    SnapshotSet::new(grids).unwrap()
}

fn series(n_grids: usize, n_vars: usize, n_time: usize) -> CoeffSeries {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let grids = (0..n_grids)
        .map(|_| DMatrix::from_fn(n_vars, n_time, |_, _| rng.gen::<f64>()))
        .collect();
    CoeffSeries::new(grids).unwrap()
}

fn bench_compute_pod(c: &mut Criterion) {
    let data = snapshots(4, 256, 100);
    c.bench_function("compute_pod_fixed_10", |b| {
        b.iter(|| compute_pod(black_box(&data), Truncation::Fixed { k: 10 }).unwrap())
    });
    c.bench_function("compute_pod_auto", |b| {
        b.iter(|| compute_pod(black_box(&data), Truncation::Auto { tolerance: 0.95 }).unwrap())
    });
}

fn bench_windowing(c: &mut Criterion) {
    let data = series(8, 10, 2000);
    c.bench_function("window_series_stride_5", |b| {
        b.iter(|| window_series(black_box(&data), 5).unwrap())
    });
}

criterion_group!(benches, bench_compute_pod, bench_windowing);
criterion_main!(benches);
