//! Box-box separating axis tests with analytic answers.
//!
//! Each case places two boxes so the axis of least overlap and its depth
//! can be worked out by hand, then checks both the raw axis test and the
//! manifold produced by [`collide`].

#![allow(clippy::unwrap_used)]

use std::f64::consts::{FRAC_PI_4, SQRT_2};

use approx::assert_relative_eq;
use impulse_contact::collide;
use impulse_contact::narrow::separating_axis_test;
use impulse_types::{Point3, Pose, Shape, UnitQuaternion, Vector3};

/// Box with full side length 2 (half-extents 1).
fn two_cube() -> Shape {
    Shape::cuboid(Vector3::new(2.0, 2.0, 2.0))
}

fn yaw(angle: f64, x: f64, y: f64, z: f64) -> Pose {
    Pose::from_position_rotation(
        Point3::new(x, y, z),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle),
    )
}

// ============================================================================
// Axis-Aligned
// ============================================================================

/// Half-extent 1 boxes 1.5 apart on X overlap by 0.5 along +X.
#[test]
fn aligned_boxes_overlap_along_x() {
    let half = Vector3::new(1.0, 1.0, 1.0);
    let sat = separating_axis_test(
        &half,
        &Pose::identity(),
        &half,
        &Pose::from_xyz(1.5, 0.0, 0.0),
    )
    .unwrap();
    assert_relative_eq!(sat.normal, Vector3::x(), epsilon = 1e-12);
    assert_relative_eq!(sat.overlap, 0.5, epsilon = 1e-12);

    let manifold = collide(
        &two_cube(),
        &Pose::identity(),
        &two_cube(),
        &Pose::from_xyz(1.5, 0.0, 0.0),
    );
    assert_eq!(manifold.len(), 4);
    for point in &manifold {
        assert_relative_eq!(point.normal, Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(point.penetration, 0.5, epsilon = 1e-12);
    }
}

/// The same boxes 3 apart are disjoint.
#[test]
fn aligned_boxes_three_apart_are_disjoint() {
    let half = Vector3::new(1.0, 1.0, 1.0);
    assert!(separating_axis_test(
        &half,
        &Pose::identity(),
        &half,
        &Pose::from_xyz(3.0, 0.0, 0.0)
    )
    .is_none());
    assert!(collide(
        &two_cube(),
        &Pose::identity(),
        &two_cube(),
        &Pose::from_xyz(3.0, 0.0, 0.0)
    )
    .is_empty());
}

/// Exactly touching faces count as separated.
#[test]
fn touching_boxes_are_disjoint() {
    let half = Vector3::new(1.0, 1.0, 1.0);
    assert!(separating_axis_test(
        &half,
        &Pose::identity(),
        &half,
        &Pose::from_xyz(0.0, 0.0, 2.0)
    )
    .is_none());
}

/// The normal always points from the first box toward the second.
#[test]
fn normal_points_from_first_to_second() {
    let half = Vector3::new(1.0, 1.0, 1.0);
    let sat = separating_axis_test(
        &half,
        &Pose::identity(),
        &half,
        &Pose::from_xyz(0.0, -1.8, 0.0),
    )
    .unwrap();
    assert_relative_eq!(sat.normal, -Vector3::y(), epsilon = 1e-12);
    assert_relative_eq!(sat.overlap, 0.2, epsilon = 1e-12);

    let manifold = collide(
        &two_cube(),
        &Pose::from_xyz(0.0, -1.8, 0.0),
        &two_cube(),
        &Pose::identity(),
    );
    assert!(!manifold.is_empty());
    for point in &manifold {
        assert_relative_eq!(point.normal, Vector3::y(), epsilon = 1e-12);
    }
}

// ============================================================================
// Rotated
// ============================================================================

/// A unit cube turned 45° about Z pokes one vertical edge into the face of an
/// aligned unit cube.
///
/// Configuration:
/// - A: unit cube at the origin
/// - B: unit cube yawed 45°, center at x = 1.1
/// - B's width along X is √2, so the overlap is 0.5 + √2/2 - 1.1
/// - The edge's two end vertices are the contacts
#[test]
fn rotated_edge_into_face() {
    let cube = Shape::cuboid(Vector3::new(1.0, 1.0, 1.0));
    let pose_b = yaw(FRAC_PI_4, 1.1, 0.0, 0.0);
    let expected = 0.5 + SQRT_2 / 2.0 - 1.1;

    let half = Vector3::new(0.5, 0.5, 0.5);
    let sat = separating_axis_test(&half, &Pose::identity(), &half, &pose_b).unwrap();
    assert_relative_eq!(sat.normal, Vector3::x(), epsilon = 1e-9);
    assert_relative_eq!(sat.overlap, expected, epsilon = 1e-9);

    let manifold = collide(&cube, &Pose::identity(), &cube, &pose_b);
    assert_eq!(manifold.len(), 2);
    for point in &manifold {
        assert_relative_eq!(point.penetration, expected, epsilon = 1e-9);
        assert_relative_eq!(point.point.x, 1.1 - SQRT_2 / 2.0, epsilon = 1e-9);
        assert_relative_eq!(point.point.z.abs(), 0.5, epsilon = 1e-9);
    }
}

/// Rotating both boxes by the same yaw leaves the overlap unchanged.
#[test]
fn common_rotation_preserves_overlap() {
    let half = Vector3::new(1.0, 0.5, 0.6);
    let angle = 0.7;
    let offset =
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle) * Vector3::new(1.5, 0.0, 0.0);
    let sat = separating_axis_test(
        &half,
        &yaw(angle, 0.0, 0.0, 0.0),
        &half,
        &yaw(angle, offset.x, offset.y, offset.z),
    )
    .unwrap();

    assert_relative_eq!(sat.overlap, 0.5, epsilon = 1e-9);
    assert_relative_eq!(
        sat.normal,
        Vector3::new(angle.cos(), angle.sin(), 0.0),
        epsilon = 1e-9
    );
}
