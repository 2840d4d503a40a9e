//! Collision shapes and their mass properties.
//!
//! The shape set is closed: every pair of kinds is dispatched by pattern
//! match in the narrow phase, so adding a kind is a compile error until every
//! pair handles it.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{PhysicsError, Pose, Result};

/// Collision shape attached to a rigid body, in the body's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    /// Oriented box.
    Box {
        /// Half-extents along the local X, Y and Z axes.
        half_extents: Vector3<f64>,
    },
    /// Sphere centered on the body origin.
    Sphere {
        /// Sphere radius.
        radius: f64,
    },
    /// Capsule (segment swept by a sphere) along the local Z axis.
    ///
    /// The segment runs from `-half_length` to `+half_length` on Z.
    Capsule {
        /// Half-length of the inner segment.
        half_length: f64,
        /// Radius of the swept sphere.
        radius: f64,
    },
}

impl Default for Shape {
    fn default() -> Self {
        Self::Sphere { radius: 0.5 }
    }
}

impl Shape {
    /// Box from full side lengths.
    #[must_use]
    pub fn cuboid(size: Vector3<f64>) -> Self {
        Self::Box {
            half_extents: size * 0.5,
        }
    }

    /// Sphere with the given radius.
    #[must_use]
    pub fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Capsule with the given segment half-length and radius.
    #[must_use]
    pub fn capsule(half_length: f64, radius: f64) -> Self {
        Self::Capsule {
            half_length,
            radius,
        }
    }

    /// Radius of a sphere centered on the body origin enclosing the shape.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        match *self {
            Self::Box { half_extents } => half_extents.norm(),
            Self::Sphere { radius } => radius,
            Self::Capsule {
                half_length,
                radius,
            } => half_length + radius,
        }
    }

    /// World-space endpoints of a capsule's inner segment.
    ///
    /// Returns `None` for other shapes.
    #[must_use]
    pub fn capsule_segment(&self, pose: &Pose) -> Option<(Point3<f64>, Point3<f64>)> {
        match *self {
            Self::Capsule { half_length, .. } => {
                let axis = pose.transform_vector(&Vector3::z()) * half_length;
                Some((pose.position - axis, pose.position + axis))
            }
            Self::Box { .. } | Self::Sphere { .. } => None,
        }
    }

    /// Reject negative or non-finite dimensions.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Box { half_extents } => {
                if half_extents.iter().any(|h| !h.is_finite() || *h < 0.0) {
                    return Err(PhysicsError::invalid_body_config(format!(
                        "box half-extents must be finite and non-negative, got {half_extents:?}"
                    )));
                }
            }
            Self::Sphere { radius } => {
                if !radius.is_finite() || radius < 0.0 {
                    return Err(PhysicsError::invalid_body_config(format!(
                        "sphere radius must be finite and non-negative, got {radius}"
                    )));
                }
            }
            Self::Capsule {
                half_length,
                radius,
            } => {
                if !radius.is_finite() || radius < 0.0 {
                    return Err(PhysicsError::invalid_body_config(format!(
                        "capsule radius must be finite and non-negative, got {radius}"
                    )));
                }
                if !half_length.is_finite() || half_length < 0.0 {
                    return Err(PhysicsError::invalid_body_config(format!(
                        "capsule half-length must be finite and non-negative, got {half_length}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Mass properties of a solid body of this shape with uniform density.
    #[must_use]
    pub fn mass_properties(&self, mass: f64) -> MassProperties {
        match *self {
            Self::Box { half_extents } => MassProperties::solid_box(mass, half_extents),
            Self::Sphere { radius } => MassProperties::solid_sphere(mass, radius),
            Self::Capsule {
                half_length,
                radius,
            } => MassProperties::solid_capsule(mass, half_length, radius),
        }
    }
}

/// Mass and principal moments of inertia (body frame).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Total mass in kg.
    pub mass: f64,
    /// Diagonal of the body-frame inertia tensor (kg·m²).
    pub inertia: Vector3<f64>,
}

impl MassProperties {
    /// Solid sphere: I = (2/5) m r².
    #[must_use]
    pub fn solid_sphere(mass: f64, radius: f64) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self {
            mass,
            inertia: Vector3::new(i, i, i),
        }
    }

    /// Solid box with the given half-extents.
    ///
    /// - Ixx = (1/12) m (y² + z²)
    /// - Iyy = (1/12) m (x² + z²)
    /// - Izz = (1/12) m (x² + y²)
    #[must_use]
    pub fn solid_box(mass: f64, half_extents: Vector3<f64>) -> Self {
        let x2 = 4.0 * half_extents.x * half_extents.x;
        let y2 = 4.0 * half_extents.y * half_extents.y;
        let z2 = 4.0 * half_extents.z * half_extents.z;

        Self {
            mass,
            inertia: Vector3::new(
                mass * (y2 + z2) / 12.0,
                mass * (x2 + z2) / 12.0,
                mass * (x2 + y2) / 12.0,
            ),
        }
    }

    /// Solid capsule along Z: a cylinder plus two hemispherical caps, mass
    /// split between them by volume.
    #[must_use]
    pub fn solid_capsule(mass: f64, half_length: f64, radius: f64) -> Self {
        let r2 = radius * radius;
        let h = 2.0 * half_length;

        let cylinder_volume = std::f64::consts::PI * r2 * h;
        let sphere_volume = 4.0 / 3.0 * std::f64::consts::PI * r2 * radius;
        let total_volume = cylinder_volume + sphere_volume;
        if total_volume <= 0.0 {
            return Self {
                mass,
                inertia: Vector3::zeros(),
            };
        }

        let m_cyl = mass * cylinder_volume / total_volume;
        let m_caps = mass * sphere_volume / total_volume;

        let izz = 0.5 * m_cyl * r2 + 0.4 * m_caps * r2;
        let ixx = m_cyl * (h * h / 12.0 + r2 / 4.0)
            + m_caps * (0.4 * r2 + h * h / 4.0 + 3.0 * h * radius / 8.0);

        Self {
            mass,
            inertia: Vector3::new(ixx, ixx, izz),
        }
    }
}
