//! Hitting-set enumeration benchmarks.
//!
//! Measures the layered enumerator across conflict universes of growing
//! size, at the layer depths the engine actually uses.
//!
//! Run with: cargo bench --bench hitting_set

use std::collections::BTreeSet;

use averia::{Conflict, HittingSetEnumerator};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

/// Conflicts with pairwise-disjoint component sets force the enumerator
/// into its deepest layer.
fn disjoint_conflicts(groups: usize, width: usize) -> Vec<Conflict> {
    (0..groups)
        .map(|g| {
            let components: BTreeSet<String> = (0..width)
                .map(|i| format!("pkg.Mod#method{:02}_{i}(int)", g))
                .collect();
            Conflict::new(components, format!("test{g}"))
        })
        .collect()
}

/// Conflicts sharing one common element resolve in the first layer.
fn overlapping_conflicts(count: usize, width: usize) -> Vec<Conflict> {
    (0..count)
        .map(|g| {
            let mut components: BTreeSet<String> = (0..width)
                .map(|i| format!("pkg.Mod#local{g}_{i}(int)"))
                .collect();
            components.insert("pkg.Mod#shared(int)".to_string());
            Conflict::new(components, format!("test{g}"))
        })
        .collect()
}

fn bench_first_layer_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_layer_hit");
    for count in [4usize, 8, 16] {
        let conflicts = overlapping_conflicts(count, 4);
        group.bench_with_input(BenchmarkId::from_parameter(count), &conflicts, |b, cs| {
            let enumerator = HittingSetEnumerator::new(3, 20);
            b.iter(|| black_box(enumerator.enumerate(black_box(cs))));
        });
    }
    group.finish();
}

fn bench_deep_layers(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_layers");
    for width in [3usize, 5, 8] {
        let conflicts = disjoint_conflicts(3, width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &conflicts, |b, cs| {
            let enumerator = HittingSetEnumerator::new(3, 20);
            b.iter(|| black_box(enumerator.enumerate(black_box(cs))));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_first_layer_hit, bench_deep_layers);
criterion_main!(benches);
