//! Sphere, capsule and sphere-box pair detectors.
//!
//! Capsules reduce to spheres placed at the closest point on their inner
//! segment, so every routine here bottoms out in [`sphere_sphere`] or
//! [`sphere_box`].

use impulse_types::math::safe_normalize;
use impulse_types::Pose;
use nalgebra::{Point3, Vector3};

use crate::{Manifold, ManifoldPoint};

/// Distance below which two points are treated as coincident.
pub const GEOM_EPSILON: f64 = 1e-10;

/// Sphere A against sphere B.
///
/// Concentric spheres have no defined normal and report no contact.
#[must_use]
pub fn sphere_sphere(
    center_a: &Point3<f64>,
    radius_a: f64,
    center_b: &Point3<f64>,
    radius_b: f64,
) -> Option<ManifoldPoint> {
    let diff = center_b - center_a;
    let dist = diff.norm();
    let sum = radius_a + radius_b;
    if dist >= sum || dist <= GEOM_EPSILON {
        return None;
    }
    let normal = diff / dist;
    Some(ManifoldPoint::new(
        center_a + normal * radius_a,
        normal,
        sum - dist,
    ))
}

/// Sphere A against box B. The normal points from the sphere into the box.
///
/// When the sphere center lies inside the box the sphere is pushed out
/// through the nearest face: the depth is the radius plus the distance to
/// that face. Equidistant faces resolve to the lowest axis.
#[must_use]
pub fn sphere_box(
    center: &Point3<f64>,
    radius: f64,
    half_extents: &Vector3<f64>,
    box_pose: &Pose,
) -> Option<ManifoldPoint> {
    let local = box_pose.inverse_transform_point(center);
    let inside = (0..3).all(|k| local[k].abs() < half_extents[k]);
    if inside {
        return Some(sphere_inside_box(&local, radius, half_extents, box_pose));
    }

    let clamped = Point3::new(
        local.x.clamp(-half_extents.x, half_extents.x),
        local.y.clamp(-half_extents.y, half_extents.y),
        local.z.clamp(-half_extents.z, half_extents.z),
    );
    let closest = box_pose.transform_point(&clamped);
    let diff = closest - center;
    let dist = diff.norm();
    if dist >= radius {
        return None;
    }

    let normal = if dist > GEOM_EPSILON {
        diff / dist
    } else {
        safe_normalize(&(box_pose.position - center))
    };
    Some(ManifoldPoint::new(closest, normal, radius - dist))
}

/// Contact for a sphere whose center `local` (box frame) is inside the box.
fn sphere_inside_box(
    local: &Point3<f64>,
    radius: f64,
    half_extents: &Vector3<f64>,
    box_pose: &Pose,
) -> ManifoldPoint {
    let (axis, face_distance) = (0..3)
        .map(|k| (k, half_extents[k] - local[k].abs()))
        .fold((0, f64::INFINITY), |best, face| if face.1 < best.1 { face } else { best });

    let side = if local[axis] < 0.0 { -1.0 } else { 1.0 };
    let mut on_face = *local;
    on_face[axis] = side * half_extents[axis];
    let mut outward = Vector3::zeros();
    outward[axis] = side;

    ManifoldPoint::new(
        box_pose.transform_point(&on_face),
        -box_pose.transform_vector(&outward),
        radius + face_distance,
    )
}

/// Closest point to `p` on the segment `a`–`b`, as a parameter in `[0, 1]`.
fn segment_parameter(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= GEOM_EPSILON * GEOM_EPSILON {
        return 0.0;
    }
    ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
}

/// Closest point to `p` on the segment `a`–`b`.
#[must_use]
pub fn closest_point_on_segment(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
) -> Point3<f64> {
    a + (b - a) * segment_parameter(p, a, b)
}

/// Closest pair of points between segments `p1`–`q1` and `p2`–`q2`.
///
/// Parallel segments return the midpoint of their overlapping interval (or
/// the nearest endpoints when they do not overlap).
#[must_use]
pub fn closest_points_segments(
    p1: &Point3<f64>,
    q1: &Point3<f64>,
    p2: &Point3<f64>,
    q2: &Point3<f64>,
) -> (Point3<f64>, Point3<f64>) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);
    let eps = GEOM_EPSILON * GEOM_EPSILON;

    if a <= eps && e <= eps {
        return (*p1, *p2);
    }
    if a <= eps {
        let t = (f / e).clamp(0.0, 1.0);
        return (*p1, p2 + d2 * t);
    }
    let c = d1.dot(&r);
    if e <= eps {
        let s = (-c / a).clamp(0.0, 1.0);
        return (p1 + d1 * s, *p2);
    }

    let b = d1.dot(&d2);
    let denom = a * e - b * b;
    if denom <= eps * a * e {
        // Parallel: project segment 2 onto segment 1 and take the middle of
        // the overlap.
        let t0 = (p2 - p1).dot(&d1) / a;
        let t1 = (q2 - p1).dot(&d1) / a;
        let lo = t0.min(t1).max(0.0);
        let hi = t0.max(t1).min(1.0);
        let s = if lo <= hi {
            0.5 * (lo + hi)
        } else if t0.max(t1) < 0.0 {
            0.0
        } else {
            1.0
        };
        let on_1 = p1 + d1 * s;
        return (on_1, closest_point_on_segment(&on_1, p2, q2));
    }

    let mut s = ((b * f - c * e) / denom).clamp(0.0, 1.0);
    let mut t = (b * s + f) / e;
    if t < 0.0 {
        t = 0.0;
        s = (-c / a).clamp(0.0, 1.0);
    } else if t > 1.0 {
        t = 1.0;
        s = ((b - c) / a).clamp(0.0, 1.0);
    }
    (p1 + d1 * s, p2 + d2 * t)
}

/// Capsule A against sphere B.
#[must_use]
pub fn capsule_sphere(
    segment: &(Point3<f64>, Point3<f64>),
    radius: f64,
    center: &Point3<f64>,
    sphere_radius: f64,
) -> Option<ManifoldPoint> {
    let closest = closest_point_on_segment(center, &segment.0, &segment.1);
    sphere_sphere(&closest, radius, center, sphere_radius)
}

/// Capsule A against capsule B.
#[must_use]
pub fn capsule_capsule(
    segment_a: &(Point3<f64>, Point3<f64>),
    radius_a: f64,
    segment_b: &(Point3<f64>, Point3<f64>),
    radius_b: f64,
) -> Option<ManifoldPoint> {
    let (on_a, on_b) =
        closest_points_segments(&segment_a.0, &segment_a.1, &segment_b.0, &segment_b.1);
    sphere_sphere(&on_a, radius_a, &on_b, radius_b)
}

/// Capsule A against box B.
///
/// Spheres at both segment endpoints and at the segment point closest to the
/// box center are each tested against the box, giving up to three contacts.
#[must_use]
pub fn capsule_box(
    segment: &(Point3<f64>, Point3<f64>),
    radius: f64,
    half_extents: &Vector3<f64>,
    box_pose: &Pose,
) -> Manifold {
    let middle = closest_point_on_segment(&box_pose.position, &segment.0, &segment.1);
    let mut samples = vec![segment.0, segment.1];
    if (middle - segment.0).norm() > GEOM_EPSILON && (middle - segment.1).norm() > GEOM_EPSILON {
        samples.push(middle);
    } else if (segment.1 - segment.0).norm() <= GEOM_EPSILON {
        samples.truncate(1);
    }

    samples
        .iter()
        .filter_map(|center| sphere_box(center, radius, half_extents, box_pose))
        .collect()
}
