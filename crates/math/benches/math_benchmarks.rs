//! Benchmarks for capflow-math operations.
#![allow(missing_docs)]

use capflow_math::{correlation, simple_regression, standardize, winsorize};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ndarray::Array1;
use rand::Rng;

fn random_array(n: usize) -> Array1<f64> {
    let mut rng = rand::thread_rng();
    Array1::from_iter((0..n).map(|_| rng.r#gen::<f64>() * 0.1 - 0.05))
}

fn random_log_caps(n: usize) -> Array1<f64> {
    let mut rng = rand::thread_rng();
    Array1::from_iter((0..n).map(|_| rng.gen_range(22.0..28.0)))
}

fn bench_winsorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("winsorize");

    for size in [100, 1000, 10000, 100000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let data = random_array(size);
            b.iter(|| winsorize(black_box(&data), black_box(3.5)).unwrap());
        });
    }

    group.finish();
}

fn bench_standardize(c: &mut Criterion) {
    let mut group = c.benchmark_group("standardize");

    for size in [100, 1000, 10000, 100000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let data = random_array(size);
            b.iter(|| standardize(black_box(&data)).unwrap());
        });
    }

    group.finish();
}

fn bench_simple_regression(c: &mut Criterion) {
    let mut group = c.benchmark_group("simple_regression");

    for size in [100, 1000, 3000, 10000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let x = random_log_caps(size);
            let y = random_array(size);
            b.iter(|| simple_regression(black_box(&x), black_box(&y)).unwrap());
        });
    }

    group.finish();
}

fn bench_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let x = random_log_caps(size);
            let y = random_array(size);
            b.iter(|| correlation(black_box(&x), black_box(&y)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_winsorize,
    bench_standardize,
    bench_simple_regression,
    bench_correlation,
);

criterion_main!(benches);
