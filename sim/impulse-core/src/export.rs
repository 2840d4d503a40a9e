//! Pose export for renderers.
//!
//! Renderers work in `f32`; this is the one place the engine narrows its
//! `f64` state.

use glam::{Quat, Vec3};
use impulse_types::{BodyHandle, Pose};

/// Floats written per body by [`write_pose`]: `[px, py, pz, qx, qy, qz, qw]`.
pub const TRANSFORM_STRIDE: usize = 7;

/// Body pose in renderer precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTransform {
    /// Body the transform belongs to.
    pub handle: BodyHandle,
    /// World position.
    pub translation: Vec3,
    /// World orientation.
    pub rotation: Quat,
}

impl RenderTransform {
    /// Narrow `pose` to `f32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(handle: BodyHandle, pose: &Pose) -> Self {
        let p = pose.position;
        let q = pose.rotation.quaternion();
        Self {
            handle,
            translation: Vec3::new(p.x as f32, p.y as f32, p.z as f32),
            rotation: Quat::from_xyzw(q.i as f32, q.j as f32, q.k as f32, q.w as f32),
        }
    }
}

/// Append `pose` to `out` as `[px, py, pz, qx, qy, qz, qw]`.
#[allow(clippy::cast_possible_truncation)]
pub fn write_pose(pose: &Pose, out: &mut Vec<f32>) {
    let p = pose.position;
    let q = pose.rotation.quaternion();
    out.extend_from_slice(&[
        p.x as f32,
        p.y as f32,
        p.z as f32,
        q.i as f32,
        q.j as f32,
        q.k as f32,
        q.w as f32,
    ]);
}
