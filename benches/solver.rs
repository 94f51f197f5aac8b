//! Benchmarks for position solving and period arithmetic.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use orrery::{closed_loop, positions_at_step, Body, BodySystem, Parent};

/// A parent chain: body i orbits body i - 1.
fn chain_system(depth: usize) -> BodySystem {
    let mut bodies = Vec::with_capacity(depth);
    for i in 0..depth {
        let parent = if i == 0 {
            Parent::Root
        } else {
            Parent::Body(i - 1)
        };
        let scale = 150.0 / (i + 1) as f64;
        bodies.push(
            Body::new(scale, scale, i as f64 + 1.0)
                .with_inclination((i as f64 * 7.0) % 90.0)
                .with_azimuth((i as f64 * 11.0) % 360.0)
                .with_parent(parent),
        );
    }
    BodySystem::from_bodies(bodies)
}

/// A hub: every body after the first orbits body 0.
fn hub_system(count: usize) -> BodySystem {
    let mut bodies = vec![Body::new(150.0, 150.0, 1.0)];
    for i in 1..count {
        bodies.push(
            Body::new(50.0 + i as f64, 75.0, (i % 9) as f64 + 0.5).with_parent(Parent::Body(0)),
        );
    }
    BodySystem::from_bodies(bodies)
}

fn bench_positions_at_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("positions_at_step");

    for depth in [2, 8, 32] {
        group.bench_with_input(BenchmarkId::new("chain", depth), &depth, |b, &depth| {
            let system = chain_system(depth);
            b.iter(|| black_box(positions_at_step(system.bodies(), black_box(417))))
        });
    }

    for count in [4, 16, 64] {
        group.bench_with_input(BenchmarkId::new("hub", count), &count, |b, &count| {
            let system = hub_system(count);
            b.iter(|| black_box(positions_at_step(system.bodies(), black_box(417))))
        });
    }

    group.finish();
}

fn bench_figure_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("figure_sweep");

    // The cost of one whole batch draw's worth of solving.
    group.bench_function("chain_8_x_1000_steps", |b| {
        let system = chain_system(8);
        b.iter(|| {
            for step in 0..1000u32 {
                black_box(positions_at_step(system.bodies(), step));
            }
        })
    });

    group.finish();
}

fn bench_closed_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("closed_loop");

    for count in [4, 16, 64] {
        group.bench_with_input(BenchmarkId::new("bodies", count), &count, |b, &count| {
            let system = chain_system(count);
            b.iter(|| black_box(closed_loop(system.bodies())))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_positions_at_step,
    bench_figure_sweep,
    bench_closed_loop,
);
criterion_main!(benches);
