//! Small vector and rotation helpers shared by every layer.
//!
//! Vectors and quaternions are plain `nalgebra` types. This module only adds
//! the NaN-safe operations the solver depends on.

use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

/// Norm below which a vector is treated as having no direction.
pub const NORMALIZE_EPSILON: f64 = 1e-10;

/// Normalize `v`, falling back to `fallback` when `v` is (nearly) zero.
#[must_use]
pub fn normalize_or(v: &Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    let norm = v.norm();
    if norm < NORMALIZE_EPSILON {
        fallback
    } else {
        v / norm
    }
}

/// Normalize `v`, falling back to +Z when `v` is (nearly) zero.
///
/// Keeps NaNs out of contact normals and tangent bases.
#[must_use]
pub fn safe_normalize(v: &Vector3<f64>) -> Vector3<f64> {
    normalize_or(v, Vector3::z())
}

/// Advance an orientation by angular velocity `omega` (world frame) over `dt`.
///
/// Uses the exponential map: the rotation `|omega| * dt` about `omega` is
/// left-multiplied onto `rotation` and the result renormalized. Rotations
/// smaller than [`NORMALIZE_EPSILON`] are skipped.
pub fn integrate_rotation(rotation: &mut UnitQuaternion<f64>, omega: &Vector3<f64>, dt: f64) {
    let speed = omega.norm();
    let angle = speed * dt;
    if angle <= NORMALIZE_EPSILON {
        return;
    }

    let axis = Unit::new_unchecked(omega / speed);
    let delta = UnitQuaternion::from_axis_angle(&axis, angle);

    // Hamilton product on the raw quaternions, then explicit renormalization.
    let composed: Quaternion<f64> = delta.quaternion() * rotation.quaternion();
    *rotation = UnitQuaternion::new_normalize(composed);
}

/// Two unit vectors spanning the plane orthogonal to `normal`.
///
/// The first tangent is `normal × X`, or `normal × Y` when the normal is
/// within ~25° of the X axis. The second is `normal × tangent1`.
#[must_use]
pub fn tangent_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let reference = if normal.x.abs() >= 0.9 {
        Vector3::y()
    } else {
        Vector3::x()
    };
    let t1 = safe_normalize(&normal.cross(&reference));
    let t2 = normal.cross(&t1);
    (t1, t2)
}
