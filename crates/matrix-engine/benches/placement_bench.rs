//! Benchmarks for placement and reporting
//!
//! Measures performance of:
//! - Spillover search on trees of increasing fill
//! - Single-sponsor placement until saturation
//! - Network statistics over a full tree

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use matrix_engine::{MatrixEngine, MemoryStore, UserId, TOTAL_NETWORK_CAPACITY};

/// Engine with `count` members all sponsored by the root.
fn filled(count: u64) -> MatrixEngine<MemoryStore> {
    let mut engine = MatrixEngine::new(MemoryStore::new());
    let _ = engine.place_at(UserId(1), None, 0);
    for user in 2..=count {
        let _ = engine.place_at(UserId(user), Some(UserId(1)), 0);
    }
    engine
}

/// Benchmark spillover search as the open frontier moves deeper
fn bench_spillover(c: &mut Criterion) {
    let mut group = c.benchmark_group("spillover_search");

    for &count in &[4u64, 40, 364, 1000] {
        let engine = filled(count);
        let Ok(Some(root)) = engine.position(UserId(1)) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(count), &root, |b, root| {
            b.iter(|| engine.find_open_position(black_box(root)))
        });
    }
    group.finish();
}

/// Benchmark filling a whole tree from one sponsor
fn bench_fill_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_tree");
    group.sample_size(10);
    group.throughput(Throughput::Elements(TOTAL_NETWORK_CAPACITY));
    group.bench_function("single_sponsor", |b| b.iter(|| filled(black_box(TOTAL_NETWORK_CAPACITY))));
    group.finish();
}

/// Benchmark statistics over a saturated tree
fn bench_network_stats(c: &mut Criterion) {
    let engine = filled(TOTAL_NETWORK_CAPACITY);
    c.bench_function("network_stats_full_tree", |b| {
        b.iter(|| engine.network_stats(black_box(UserId(1))))
    });
}

criterion_group!(benches, bench_spillover, bench_fill_tree, bench_network_stats);

criterion_main!(benches);
