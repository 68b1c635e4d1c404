//! Benchmarks for contshadow.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use contshadow::{
    annotate_contiguous_container, verify_contiguous_container_with, ContainerShadow,
    MemoryShadow, ShadowConfig, VerifyMode,
};

const BASE: usize = 0x10_0000;

fn bench_annotate_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("annotate_step");

    // One-element push/pop on regions of growing size: cost should stay flat.
    for size in [256usize, 4096, 65536, 1 << 20] {
        let mut shadow = MemoryShadow::new();
        let end = BASE + size;
        let mid = BASE + size / 2 + 3;
        annotate_contiguous_container(&mut shadow, BASE, end, end, mid);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                annotate_contiguous_container(&mut shadow, BASE, end, mid, mid + 4);
                annotate_contiguous_container(&mut shadow, BASE, end, mid + 4, mid);
                black_box(&shadow);
            })
        });
    }

    group.finish();
}

fn bench_annotate_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("annotate_distance");
    let end = BASE + (1 << 20);

    // Fixed region, growing boundary move: cost should track the distance.
    for distance in [8usize, 64, 512, 4096] {
        let mut shadow = MemoryShadow::new();
        annotate_contiguous_container(&mut shadow, BASE, end, end, BASE);

        group.throughput(Throughput::Bytes(distance as u64));
        group.bench_with_input(BenchmarkId::from_parameter(distance), &distance, |b, &d| {
            b.iter(|| {
                annotate_contiguous_container(&mut shadow, BASE, end, BASE, BASE + d);
                annotate_contiguous_container(&mut shadow, BASE, end, BASE + d, BASE);
                black_box(&shadow);
            })
        });
    }

    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify");

    for size in [4096usize, 65536] {
        let mut shadow = MemoryShadow::new();
        let end = BASE + size;
        let mid = BASE + size / 3;
        annotate_contiguous_container(&mut shadow, BASE, end, end, mid);

        group.bench_with_input(BenchmarkId::new("sampled", size), &size, |b, _| {
            b.iter(|| {
                black_box(verify_contiguous_container_with(
                    &shadow,
                    BASE,
                    mid,
                    end,
                    VerifyMode::sampled(),
                ))
            })
        });

        group.bench_with_input(BenchmarkId::new("full", size), &size, |b, _| {
            b.iter(|| {
                black_box(verify_contiguous_container_with(
                    &shadow,
                    BASE,
                    mid,
                    end,
                    VerifyMode::Full,
                ))
            })
        });
    }

    group.finish();
}

fn bench_shadowed_vec(c: &mut Criterion) {
    let mut group = c.benchmark_group("shadowed_vec");

    let minimal = ContainerShadow::new(MemoryShadow::new(), ShadowConfig::minimal());
    group.bench_function("push_pop_1000x_minimal", |b| {
        let mut list = minimal.vec_with_capacity::<u64>(1000).unwrap();
        b.iter(|| {
            for i in 0..1000u64 {
                let _ = list.push(i);
            }
            while let Some(v) = list.pop() {
                black_box(v);
            }
        })
    });

    let paranoid = ContainerShadow::new(MemoryShadow::new(), ShadowConfig::paranoid());
    group.bench_function("push_pop_100x_paranoid", |b| {
        let mut list = paranoid.vec_with_capacity::<u64>(100).unwrap();
        b.iter(|| {
            for i in 0..100u64 {
                let _ = list.push(i);
            }
            while let Some(v) = list.pop() {
                black_box(v);
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_annotate_step,
    bench_annotate_distance,
    bench_verify,
    bench_shadowed_vec,
);
criterion_main!(benches);
