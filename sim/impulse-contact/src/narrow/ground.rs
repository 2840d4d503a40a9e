//! Shape versus the horizontal ground plane.
//!
//! The plane normal is +Z. Contact normals point from the ground toward the
//! body, and contact points are projected onto the plane.

use impulse_types::Pose;
use nalgebra::{Point3, Vector3};

use crate::{Manifold, ManifoldPoint};

/// Local corners of a box, in `(-,-,-), (+,-,-), (-,+,-), …` order.
pub(crate) fn box_corners(half_extents: &Vector3<f64>) -> [Point3<f64>; 8] {
    let mut corners = [Point3::origin(); 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
        let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
        let sz = if i & 4 == 0 { -1.0 } else { 1.0 };
        *corner = Point3::new(
            sx * half_extents.x,
            sy * half_extents.y,
            sz * half_extents.z,
        );
    }
    corners
}

/// Box against the ground: one contact per corner below the plane.
///
/// A resting box produces four contacts, a box sunk through the plane up to
/// eight.
#[must_use]
pub fn box_ground(half_extents: &Vector3<f64>, pose: &Pose, height: f64) -> Manifold {
    box_corners(half_extents)
        .iter()
        .map(|corner| pose.transform_point(corner))
        .filter(|corner| corner.z < height)
        .map(|corner| {
            ManifoldPoint::new(
                Point3::new(corner.x, corner.y, height),
                Vector3::z(),
                height - corner.z,
            )
        })
        .collect()
}

/// Sphere against the ground.
#[must_use]
pub fn sphere_ground(center: &Point3<f64>, radius: f64, height: f64) -> Option<ManifoldPoint> {
    let bottom = center.z - radius;
    (bottom < height).then(|| {
        ManifoldPoint::new(
            Point3::new(center.x, center.y, height),
            Vector3::z(),
            height - bottom,
        )
    })
}

/// Capsule against the ground: each segment endpoint is tested as a sphere.
#[must_use]
pub fn capsule_ground(
    segment: &(Point3<f64>, Point3<f64>),
    radius: f64,
    height: f64,
) -> Manifold {
    [segment.0, segment.1]
        .iter()
        .filter_map(|end| sphere_ground(end, radius, height))
        .collect()
}
