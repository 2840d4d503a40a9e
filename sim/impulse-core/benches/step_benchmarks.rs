//! Benchmarks for world stepping and narrow-phase collision.
//!
//! Run with: cargo bench -p impulse-core

#![allow(
    missing_docs,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::unwrap_used
)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use impulse_contact::collide;
use impulse_core::World;
use impulse_types::{Point3, Pose, Shape, UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FIXED_DT: f64 = 1.0 / 240.0;

/// A random pile of boxes and spheres dropped over a 4 m × 4 m area.
///
/// Seeded so every run benchmarks the same scene.
fn random_pile(count: usize, seed: u64) -> World {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = World::default();

    for i in 0..count {
        let position = Point3::new(
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-2.0..2.0),
            rng.gen_range(0.5..4.0),
        );
        let rotation = UnitQuaternion::from_euler_angles(
            rng.gen_range(-0.5..0.5),
            rng.gen_range(-0.5..0.5),
            rng.gen_range(-3.0..3.0),
        );
        let pose = Pose::from_position_rotation(position, rotation);
        if i % 2 == 0 {
            let size = Vector3::new(
                rng.gen_range(0.2..0.6),
                rng.gen_range(0.2..0.6),
                rng.gen_range(0.2..0.6),
            );
            world.create_box(size, 1.0, pose, false).unwrap();
        } else {
            world
                .create_sphere(rng.gen_range(0.1..0.3), 0.5, pose, false)
                .unwrap();
        }
    }
    world
}

/// One second of simulation for piles of increasing size.
fn bench_pile_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("pile_step");
    group.sample_size(20);

    for count in [8, 32, 64] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter_batched(
                || random_pile(count, 42),
                |mut world| {
                    for _ in 0..240 {
                        world.step(FIXED_DT);
                    }
                    black_box(world.total_kinetic_energy())
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Single substeps of a pile that has already come to rest.
fn bench_settled_substep(c: &mut Criterion) {
    let mut world = random_pile(32, 7);
    for _ in 0..480 {
        world.step(FIXED_DT);
    }

    c.bench_function("settled_substep_32", |b| {
        b.iter(|| {
            world.step_fixed(FIXED_DT);
            black_box(world.contacts().len())
        });
    });
}

/// Narrow-phase box-box: overlapping rotated pair, and a separated pair that
/// exits early.
fn bench_box_box(c: &mut Criterion) {
    let cube = Shape::cuboid(Vector3::new(1.0, 1.0, 1.0));
    let tilted = Pose::from_position_rotation(
        Point3::new(0.0, 0.0, 0.9),
        UnitQuaternion::from_euler_angles(0.3, 0.2, 0.7),
    );
    let far = Pose::from_xyz(5.0, 0.0, 0.0);

    let mut group = c.benchmark_group("box_box");
    group.bench_function("overlapping", |b| {
        b.iter(|| black_box(collide(&cube, &Pose::identity(), &cube, black_box(&tilted))));
    });
    group.bench_function("separated", |b| {
        b.iter(|| black_box(collide(&cube, &Pose::identity(), &cube, black_box(&far))));
    });
    group.finish();
}

criterion_group!(benches, bench_pile_step, bench_settled_substep, bench_box_box);
criterion_main!(benches);
