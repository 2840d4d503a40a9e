//! Fixed-timestep stepping tests.
//!
//! Covers the frame-time accumulator as seen through [`World::step`]:
//!
//! - Substep counts for ordinary frame times
//! - The catch-up guard after a long stall
//! - Bit-for-bit determinism of identical runs
//! - Handle invalidation across removal and reuse

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use approx::assert_relative_eq;
use impulse_core::World;
use impulse_types::{Point3, Pose, RigidBody, Shape, UnitQuaternion, Vector3, WorldConfig};

const FIXED_DT: f64 = 1.0 / 240.0;

/// A small mixed scene: boxes and spheres, some tilted, some spinning.
fn build_scene() -> World {
    let mut world = World::default();
    world
        .create_box(
            Vector3::new(3.0, 3.0, 0.4),
            1.0,
            Pose::from_xyz(0.0, 0.0, 0.2),
            true,
        )
        .unwrap();
    for i in 0..4 {
        let x = f64::from(i) * 0.7 - 1.0;
        let tilt = UnitQuaternion::from_euler_angles(0.1 * f64::from(i), 0.2, 0.0);
        world
            .add_body(
                RigidBody::new(
                    Shape::cuboid(Vector3::new(0.5, 0.5, 0.5)),
                    1.0,
                    Pose::from_position_rotation(Point3::new(x, 0.0, 1.5), tilt),
                )
                .with_angular_velocity(Vector3::new(0.0, 0.0, 1.0)),
            )
            .unwrap();
        world
            .create_sphere(0.2, 0.5, Pose::from_xyz(x, 0.3, 2.5), false)
            .unwrap();
    }
    world
}

// ============================================================================
// Accumulator
// ============================================================================

/// A 60 Hz frame at 240 Hz substeps runs roughly four substeps.
#[test]
fn frame_runs_whole_substeps() {
    let mut world = World::default();
    world
        .create_sphere(0.5, 1.0, Pose::from_xyz(0.0, 0.0, 5.0), false)
        .unwrap();

    let mut total = 0;
    for _ in 0..60 {
        let stats = world.step(1.0 / 60.0);
        assert!(stats.substeps >= 3 && stats.substeps <= 5);
        assert_eq!(stats.dropped_time, 0.0);
        total += stats.substeps;
    }

    // One second of frames is one second of simulation, give or take a substep.
    assert!((239..=240).contains(&total), "ran {total} substeps");
    assert_eq!(world.substep_count(), total as u64);
    assert!(world.time_accumulator() < FIXED_DT);
}

/// Frames shorter than a substep accumulate until a substep is due.
#[test]
fn short_frames_accumulate() {
    let mut world = World::default();
    assert_eq!(world.step(FIXED_DT * 0.4).substeps, 0);
    assert_eq!(world.step(FIXED_DT * 0.4).substeps, 0);
    assert_relative_eq!(world.time_accumulator(), FIXED_DT * 0.8, epsilon = 1e-15);
    assert_eq!(world.step(FIXED_DT * 0.4).substeps, 1);
    assert_relative_eq!(world.time_accumulator(), FIXED_DT * 0.2, epsilon = 1e-12);
}

/// After a 1000-substep stall only `max_substeps` run and the backlog is
/// discarded instead of carried into later frames.
#[test]
fn stall_is_capped_and_discarded() {
    let mut world = World::default();
    let ball = world
        .create_sphere(0.5, 1.0, Pose::from_xyz(0.0, 0.0, 50.0), false)
        .unwrap();
    let max_substeps = world.config().max_substeps;

    let stats = world.step(1000.0 * FIXED_DT);
    assert_eq!(stats.substeps, max_substeps);
    assert!(stats.dropped_time > 0.0);
    assert!(world.time_accumulator() <= FIXED_DT * max_substeps as f64);
    assert_relative_eq!(world.time(), max_substeps as f64 * FIXED_DT, epsilon = 1e-12);

    // The next ordinary frame is not burdened by the stall.
    let stats = world.step(FIXED_DT);
    assert_eq!(stats.substeps, 1);
    assert_eq!(stats.dropped_time, 0.0);
    assert!(world.pose(ball).unwrap().position.z < 50.0);
}

/// A backlog the catch-up cap can still absorb is kept for the next frame.
#[test]
fn moderate_backlog_is_kept() {
    let mut world = World::new(WorldConfig::default().with_max_substeps(4));
    let stats = world.step(6.5 * FIXED_DT);
    assert_eq!(stats.substeps, 4);
    assert_eq!(stats.dropped_time, 0.0);
    assert_relative_eq!(world.time_accumulator(), 2.5 * FIXED_DT, epsilon = 1e-12);
}

// ============================================================================
// Determinism
// ============================================================================

/// Two identical scenes stepped with identical frame times produce
/// bit-identical poses and velocities.
#[test]
fn identical_runs_are_bit_identical() {
    let mut first = build_scene();
    let mut second = build_scene();

    let frames = [1.0 / 60.0, 1.0 / 144.0, 1.0 / 30.0, 1.0 / 90.0];
    for i in 0..240 {
        let dt = frames[i % frames.len()];
        let a = first.step(dt);
        let b = second.step(dt);
        assert_eq!(a, b);
    }

    let mut poses_a = Vec::new();
    let mut poses_b = Vec::new();
    first.write_transforms(&mut poses_a);
    second.write_transforms(&mut poses_b);
    assert_eq!(poses_a, poses_b);

    for ((ha, a), (hb, b)) in first.bodies().zip(second.bodies()) {
        assert_eq!(ha, hb);
        assert_eq!(a.pose, b.pose);
        assert_eq!(a.linear_velocity, b.linear_velocity);
        assert_eq!(a.angular_velocity, b.angular_velocity);
    }
    assert_eq!(first.contacts().len(), second.contacts().len());
}

// ============================================================================
// Handles
// ============================================================================

/// Removing a body mid-simulation invalidates its handle and drops its
/// contacts, while the remaining bodies keep simulating.
#[test]
fn removed_body_handle_stays_invalid() {
    let mut world = World::default();
    let a = world
        .create_box(Vector3::new(1.0, 1.0, 1.0), 1.0, Pose::from_xyz(0.0, 0.0, 0.45), false)
        .unwrap();
    let b = world
        .create_sphere(0.5, 1.0, Pose::from_xyz(3.0, 0.0, 0.45), false)
        .unwrap();
    world.step(FIXED_DT);
    assert!(world.contacts().iter().any(|c| c.involves(a)));

    world.remove_body(a).unwrap();
    assert!(world.contacts().iter().all(|c| !c.involves(a)));
    assert!(world.pose(a).unwrap_err().is_invalid_body());

    let c = world
        .create_sphere(0.5, 1.0, Pose::from_xyz(-3.0, 0.0, 0.45), false)
        .unwrap();
    assert_eq!(c.index(), a.index());
    assert_ne!(c, a);

    for _ in 0..10 {
        world.step(FIXED_DT);
    }
    assert!(world.pose(a).is_err());
    assert!(world.pose(b).is_ok());
    assert!(world.pose(c).is_ok());
    assert_eq!(world.body_count(), 2);
}
