//! Contact records produced by the narrow phase and consumed by the solver.

use impulse_types::BodyHandle;
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One contact point between two shapes, before it is tied to bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ManifoldPoint {
    /// Contact location in world coordinates.
    pub point: Point3<f64>,
    /// Unit normal pointing from the first shape toward the second.
    pub normal: Vector3<f64>,
    /// Overlap depth (positive when penetrating).
    pub penetration: f64,
}

impl ManifoldPoint {
    /// Create a manifold point.
    #[must_use]
    pub fn new(point: Point3<f64>, normal: Vector3<f64>, penetration: f64) -> Self {
        Self {
            point,
            normal,
            penetration,
        }
    }

    /// Same point seen from the other shape.
    #[must_use]
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Contact points between one pair of shapes.
///
/// Eight inline slots cover the worst case (box resting on the ground).
pub type Manifold = SmallVec<[ManifoldPoint; 8]>;

/// A solver contact between two bodies, or between a body and the ground.
///
/// Valid until the next substep rebuilds the contact list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contact {
    /// First body, or `None` for the ground plane.
    pub body_a: Option<BodyHandle>,
    /// Second body.
    pub body_b: BodyHandle,
    /// Contact location in world coordinates.
    pub point: Point3<f64>,
    /// Unit normal from A toward B.
    pub normal: Vector3<f64>,
    /// Overlap depth (positive when penetrating).
    pub penetration: f64,
    /// Normal impulse accumulated by the solver (never negative).
    pub accumulated_normal_impulse: f64,
    /// Friction impulse accumulated along the first tangent.
    pub accumulated_tangent_impulse_1: f64,
    /// Friction impulse accumulated along the second tangent.
    pub accumulated_tangent_impulse_2: f64,
}

impl Contact {
    /// Contact between two bodies.
    #[must_use]
    pub fn between(body_a: BodyHandle, body_b: BodyHandle, point: &ManifoldPoint) -> Self {
        Self::new(Some(body_a), body_b, point)
    }

    /// Contact between the ground plane and `body`. The normal points up.
    #[must_use]
    pub fn with_ground(body: BodyHandle, point: &ManifoldPoint) -> Self {
        Self::new(None, body, point)
    }

    fn new(body_a: Option<BodyHandle>, body_b: BodyHandle, point: &ManifoldPoint) -> Self {
        Self {
            body_a,
            body_b,
            point: point.point,
            normal: point.normal,
            penetration: point.penetration,
            accumulated_normal_impulse: 0.0,
            accumulated_tangent_impulse_1: 0.0,
            accumulated_tangent_impulse_2: 0.0,
        }
    }

    /// Whether A is the ground plane.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        self.body_a.is_none()
    }

    /// Whether `handle` takes part in this contact.
    #[must_use]
    pub fn involves(&self, handle: BodyHandle) -> bool {
        self.body_b == handle || self.body_a == Some(handle)
    }

    /// Total impulse applied to B over the last solve (world frame).
    #[must_use]
    pub fn impulse(&self, tangent_1: &Vector3<f64>, tangent_2: &Vector3<f64>) -> Vector3<f64> {
        self.normal * self.accumulated_normal_impulse
            + tangent_1 * self.accumulated_tangent_impulse_1
            + tangent_2 * self.accumulated_tangent_impulse_2
    }

    /// Reset the accumulated impulses.
    pub fn reset_impulses(&mut self) {
        self.accumulated_normal_impulse = 0.0;
        self.accumulated_tangent_impulse_1 = 0.0;
        self.accumulated_tangent_impulse_2 = 0.0;
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_contact() {
        let body = BodyHandle::new(0, 0);
        let point = ManifoldPoint::new(Point3::origin(), Vector3::z(), 0.01);
        let contact = Contact::with_ground(body, &point);

        assert!(contact.is_ground());
        assert!(contact.involves(body));
        assert!(!contact.involves(BodyHandle::new(1, 0)));
        assert_eq!(contact.accumulated_normal_impulse, 0.0);
    }

    #[test]
    fn test_flipped_keeps_point_and_depth() {
        let point = ManifoldPoint::new(Point3::new(1.0, 2.0, 3.0), Vector3::x(), 0.2);
        let flipped = point.flipped();
        assert_eq!(flipped.normal, -Vector3::x());
        assert_eq!(flipped.point, point.point);
        assert_eq!(flipped.penetration, point.penetration);
    }
}
