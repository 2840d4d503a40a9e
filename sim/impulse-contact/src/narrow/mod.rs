//! Narrow-phase collision detection.
//!
//! Detectors are pure functions of shape and pose. [`collide`] dispatches on
//! the pair of shape kinds and flips the result for reversed pairs, so every
//! manifold it returns has normals pointing from the first shape to the
//! second.

mod box_box;
mod ground;
mod pair_convex;

pub use box_box::{
    box_box, reduce_manifold, separating_axis_test, SatAxis, SatFeature, CONTAINMENT_TOLERANCE,
    FACE_AXIS_PREFERENCE, MAX_MANIFOLD_POINTS,
};
pub use ground::{box_ground, capsule_ground, sphere_ground};
pub use pair_convex::{
    capsule_box, capsule_capsule, capsule_sphere, closest_point_on_segment,
    closest_points_segments, sphere_box, sphere_sphere, GEOM_EPSILON,
};

use impulse_types::{Pose, Shape};
use nalgebra::{Point3, Vector3};

use crate::{Manifold, ManifoldPoint};

fn single(point: Option<ManifoldPoint>) -> Manifold {
    point.into_iter().collect()
}

fn flip(manifold: Manifold) -> Manifold {
    manifold.into_iter().map(ManifoldPoint::flipped).collect()
}

/// World-space inner segment of a capsule along the local Z axis.
fn segment(half_length: f64, pose: &Pose) -> (Point3<f64>, Point3<f64>) {
    let axis = pose.transform_vector(&Vector3::z()) * half_length;
    (pose.position - axis, pose.position + axis)
}

/// Contacts between shape A at `pose_a` and shape B at `pose_b`.
///
/// Normals point from A toward B.
#[must_use]
pub fn collide(shape_a: &Shape, pose_a: &Pose, shape_b: &Shape, pose_b: &Pose) -> Manifold {
    match (*shape_a, *shape_b) {
        (Shape::Sphere { radius: ra }, Shape::Sphere { radius: rb }) => single(sphere_sphere(
            &pose_a.position,
            ra,
            &pose_b.position,
            rb,
        )),
        (Shape::Sphere { radius }, Shape::Box { half_extents }) => {
            single(sphere_box(&pose_a.position, radius, &half_extents, pose_b))
        }
        (Shape::Box { half_extents }, Shape::Sphere { radius }) => flip(single(sphere_box(
            &pose_b.position,
            radius,
            &half_extents,
            pose_a,
        ))),
        (Shape::Box { half_extents: ha }, Shape::Box { half_extents: hb }) => {
            box_box(&ha, pose_a, &hb, pose_b)
        }
        (
            Shape::Capsule {
                half_length,
                radius,
            },
            Shape::Sphere { radius: rb },
        ) => single(capsule_sphere(
            &segment(half_length, pose_a),
            radius,
            &pose_b.position,
            rb,
        )),
        (
            Shape::Sphere { radius: ra },
            Shape::Capsule {
                half_length,
                radius,
            },
        ) => flip(single(capsule_sphere(
            &segment(half_length, pose_b),
            radius,
            &pose_a.position,
            ra,
        ))),
        (
            Shape::Capsule {
                half_length: la,
                radius: ra,
            },
            Shape::Capsule {
                half_length: lb,
                radius: rb,
            },
        ) => single(capsule_capsule(
            &segment(la, pose_a),
            ra,
            &segment(lb, pose_b),
            rb,
        )),
        (
            Shape::Capsule {
                half_length,
                radius,
            },
            Shape::Box { half_extents },
        ) => capsule_box(&segment(half_length, pose_a), radius, &half_extents, pose_b),
        (
            Shape::Box { half_extents },
            Shape::Capsule {
                half_length,
                radius,
            },
        ) => flip(capsule_box(
            &segment(half_length, pose_b),
            radius,
            &half_extents,
            pose_a,
        )),
    }
}

/// Contacts between a shape and the ground plane at `height`.
///
/// Normals are +Z (ground toward body).
#[must_use]
pub fn collide_ground(shape: &Shape, pose: &Pose, height: f64) -> Manifold {
    match *shape {
        Shape::Box { half_extents } => box_ground(&half_extents, pose, height),
        Shape::Sphere { radius } => single(sphere_ground(&pose.position, radius, height)),
        Shape::Capsule {
            half_length,
            radius,
        } => capsule_ground(&segment(half_length, pose), radius, height),
    }
}
