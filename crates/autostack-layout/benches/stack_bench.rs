//! Benchmarks for stack offset recomputation.
//!
//! Run with: cargo bench -p autostack-layout

use autostack_layout::{BoxId, BoxSize, StackState, stack_positions};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn sizes(n: usize) -> Vec<BoxSize> {
    (0..n)
        .map(|i| BoxSize::new(1280.0, 40.0 + (i % 7) as f64 * 25.0))
        .collect()
}

fn settled_state(n: u32) -> StackState {
    let mut state = StackState::new();
    for i in 0..n {
        state = state.with_mounted(BoxId(i)).expect("fresh id");
    }
    for (i, size) in sizes(n as usize).into_iter().enumerate() {
        state = state.with_size(BoxId(i as u32), size).expect("first report");
    }
    state
}

fn bench_stack_positions(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/stack_positions");
    for n in [4usize, 64, 1_024] {
        let input = sizes(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &input, |b, input| {
            b.iter(|| stack_positions(black_box(input)))
        });
    }
    group.finish();
}

/// One report against a settled stack, alternating heights so every
/// iteration is a real transition.
fn bench_with_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/with_size");
    for n in [4u32, 64, 1_024] {
        let state = settled_state(n);
        let target = BoxId(n / 2);
        let mut flip = false;
        group.bench_with_input(BenchmarkId::from_parameter(n), &state, |b, state| {
            b.iter(|| {
                flip = !flip;
                let h = if flip { 333.0 } else { 334.0 };
                state.with_size(black_box(target), BoxSize::new(1280.0, h))
            })
        });
    }
    group.finish();
}

/// Mount-time burst: every box reports once, each report restacking all slots.
fn bench_mount_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/mount_burst");
    for n in [4u32, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| settled_state(black_box(n)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_stack_positions,
    bench_with_size,
    bench_mount_burst
);

criterion_main!(benches);
