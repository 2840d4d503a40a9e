//! Rigid body state and per-body dynamics.
//!
//! A [`RigidBody`] carries its own integration and impulse routines so the
//! solver and the world loop can stay agnostic of static/kinematic rules:
//! those checks live here, in one place.

use nalgebra::{Matrix3, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::math::integrate_rotation;
use crate::{PhysicsError, Pose, Result, Shape};

/// Mass (or principal moment) at or below which the inverse is taken as zero.
pub const MASS_EPSILON: f64 = 1e-10;

/// A simulated rigid body.
///
/// Velocities, forces and torques are expressed in the world frame; the
/// inertia is the diagonal of the body-frame tensor.
///
/// Static bodies have zero inverse mass and inertia and are never touched by
/// integration or impulses. Kinematic bodies move with their velocity but
/// ignore forces and impulses.
///
/// # Example
///
/// ```
/// use impulse_types::{Pose, RigidBody, Shape};
/// use nalgebra::Vector3;
///
/// let mut body = RigidBody::new(Shape::sphere(0.5), 2.0, Pose::from_xyz(0.0, 0.0, 1.0));
/// body.integrate_forces(0.1, &Vector3::new(0.0, 0.0, -10.0));
/// assert!((body.linear_velocity.z + 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBody {
    /// Optional name for lookup and debugging.
    pub name: Option<String>,
    /// Collision shape in the body frame.
    pub shape: Shape,
    /// Mass in kg. Ignored for static and kinematic bodies.
    pub mass: f64,
    /// Principal moments of inertia (body frame, kg·m²).
    pub inertia: Vector3<f64>,
    /// Immovable body: never integrated, never pushed.
    pub is_static: bool,
    /// Velocity-driven body: integrated, but unaffected by forces or contacts.
    pub is_kinematic: bool,
    /// Current pose.
    pub pose: Pose,
    /// Linear velocity (m/s, world frame).
    pub linear_velocity: Vector3<f64>,
    /// Angular velocity (rad/s, world frame).
    pub angular_velocity: Vector3<f64>,
    /// Force accumulated since the last force integration (world frame).
    pub force: Vector3<f64>,
    /// Torque accumulated since the last force integration (world frame).
    pub torque: Vector3<f64>,
    /// Linear damping rate (1/s): `v *= 1 - linear_damping * dt`.
    pub linear_damping: f64,
    /// Angular damping rate (1/s): `ω *= 1 - angular_damping * dt`.
    pub angular_damping: f64,
    /// Collision type bitmask.
    pub contype: u32,
    /// Collision affinity bitmask.
    pub conaffinity: u32,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new(Shape::default(), 1.0, Pose::identity())
    }
}

impl RigidBody {
    /// Dynamic body with inertia derived from `shape` and `mass`.
    #[must_use]
    pub fn new(shape: Shape, mass: f64, pose: Pose) -> Self {
        let props = shape.mass_properties(mass);
        Self {
            name: None,
            shape,
            mass: props.mass,
            inertia: props.inertia,
            is_static: false,
            is_kinematic: false,
            pose,
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
            linear_damping: 0.0,
            angular_damping: 0.0,
            contype: 1,
            conaffinity: 1,
        }
    }

    /// Static body at `pose`.
    #[must_use]
    pub fn new_static(shape: Shape, pose: Pose) -> Self {
        Self {
            is_static: true,
            ..Self::new(shape, 0.0, pose)
        }
    }

    /// Kinematic body at `pose`, moving with `linear_velocity`.
    #[must_use]
    pub fn new_kinematic(shape: Shape, pose: Pose, linear_velocity: Vector3<f64>) -> Self {
        Self {
            is_kinematic: true,
            linear_velocity,
            ..Self::new(shape, 0.0, pose)
        }
    }

    /// Set the body name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set linear and angular damping rates.
    #[must_use]
    pub fn with_damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Set the initial linear velocity.
    #[must_use]
    pub fn with_linear_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Set the initial angular velocity.
    #[must_use]
    pub fn with_angular_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.angular_velocity = velocity;
        self
    }

    /// Set the collision filtering bitmasks.
    ///
    /// Bodies A and B collide only if
    /// `(A.contype & B.conaffinity) != 0 && (B.contype & A.conaffinity) != 0`.
    #[must_use]
    pub fn with_collision_filter(mut self, contype: u32, conaffinity: u32) -> Self {
        self.contype = contype;
        self.conaffinity = conaffinity;
        self
    }

    /// Whether the bitmasks allow contacts with `other`.
    #[must_use]
    pub fn can_collide_with(&self, other: &Self) -> bool {
        (self.contype & other.conaffinity) != 0 && (other.contype & self.conaffinity) != 0
    }

    /// True for bodies that respond to forces and impulses.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        !self.is_static && !self.is_kinematic
    }

    /// Inverse mass; zero for static, kinematic and near-massless bodies.
    #[must_use]
    pub fn inv_mass(&self) -> f64 {
        if !self.is_dynamic() || self.mass <= MASS_EPSILON {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Inverse principal moments (body frame); zero where a moment vanishes.
    #[must_use]
    pub fn inv_inertia(&self) -> Vector3<f64> {
        if !self.is_dynamic() {
            return Vector3::zeros();
        }
        self.inertia.map(|i| if i <= MASS_EPSILON { 0.0 } else { 1.0 / i })
    }

    /// World-frame inertia tensor `R · diag(I) · Rᵀ`.
    #[must_use]
    pub fn world_inertia(&self) -> Matrix3<f64> {
        let r = self.pose.rotation_matrix();
        r * Matrix3::from_diagonal(&self.inertia) * r.transpose()
    }

    /// World-frame inverse inertia tensor `R · diag(I⁻¹) · Rᵀ`.
    ///
    /// Recomputed from the current orientation on every call.
    #[must_use]
    pub fn world_inertia_inv(&self) -> Matrix3<f64> {
        let r = self.pose.rotation_matrix();
        r * Matrix3::from_diagonal(&self.inv_inertia()) * r.transpose()
    }

    /// Velocity of the material point currently at `point` (world frame).
    #[must_use]
    pub fn velocity_at_point(&self, point: &Point3<f64>) -> Vector3<f64> {
        self.linear_velocity + self.angular_velocity.cross(&(point - self.pose.position))
    }

    /// Translational plus rotational kinetic energy.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        if !self.is_dynamic() {
            return 0.0;
        }
        let linear = 0.5 * self.mass * self.linear_velocity.norm_squared();
        let angular = 0.5 * self.angular_velocity.dot(&(self.world_inertia() * self.angular_velocity));
        linear + angular
    }

    /// Accumulate a force at the center of mass.
    pub fn apply_force(&mut self, force: Vector3<f64>) {
        if self.is_dynamic() {
            self.force += force;
        }
    }

    /// Accumulate a torque.
    pub fn apply_torque(&mut self, torque: Vector3<f64>) {
        if self.is_dynamic() {
            self.torque += torque;
        }
    }

    /// Accumulate a force applied at a world-space point.
    pub fn apply_force_at_point(&mut self, force: Vector3<f64>, point: &Point3<f64>) {
        if self.is_dynamic() {
            self.force += force;
            self.torque += (point - self.pose.position).cross(&force);
        }
    }

    /// Apply an instantaneous impulse at a world-space point.
    pub fn apply_impulse_at_point(&mut self, impulse: &Vector3<f64>, point: &Point3<f64>) {
        if !self.is_dynamic() {
            return;
        }
        let r = point - self.pose.position;
        self.linear_velocity += impulse * self.inv_mass();
        self.angular_velocity += self.world_inertia_inv() * r.cross(impulse);
    }

    /// Integrate accumulated forces, gravity and damping into velocities.
    ///
    /// The angular update includes the gyroscopic term `-ω × (I ω)`. The
    /// accumulators are cleared whether or not the body is dynamic.
    pub fn integrate_forces(&mut self, dt: f64, gravity: &Vector3<f64>) {
        if self.is_dynamic() {
            self.linear_velocity += (gravity + self.force * self.inv_mass()) * dt;

            let omega = self.angular_velocity;
            let effective_torque = self.torque - omega.cross(&(self.world_inertia() * omega));
            self.angular_velocity += self.world_inertia_inv() * effective_torque * dt;

            self.linear_velocity *= (1.0 - self.linear_damping * dt).max(0.0);
            self.angular_velocity *= (1.0 - self.angular_damping * dt).max(0.0);
        }
        self.clear_forces();
    }

    /// Integrate velocities into the pose. Static bodies are skipped.
    pub fn integrate_positions(&mut self, dt: f64) {
        if self.is_static {
            return;
        }
        self.pose.position += self.linear_velocity * dt;
        integrate_rotation(&mut self.pose.rotation, &self.angular_velocity, dt);
    }

    /// Zero the force and torque accumulators.
    pub fn clear_forces(&mut self) {
        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
    }

    /// Reject configurations that would make the simulation meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.mass.is_finite() || self.mass < 0.0 {
            return Err(PhysicsError::invalid_body_config(format!(
                "mass must be finite and non-negative, got {}",
                self.mass
            )));
        }
        if self.inertia.iter().any(|i| !i.is_finite() || *i < 0.0) {
            return Err(PhysicsError::invalid_body_config(
                "inertia moments must be finite and non-negative",
            ));
        }
        if self.linear_damping < 0.0 || self.angular_damping < 0.0 {
            return Err(PhysicsError::invalid_body_config(
                "damping cannot be negative",
            ));
        }
        if !self.pose.is_finite() {
            return Err(PhysicsError::invalid_body_config("pose must be finite"));
        }
        self.shape.validate()
    }
}
