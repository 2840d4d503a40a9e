//! The simulation world: body ownership, the fixed-timestep loop, and
//! read-back.
//!
//! Every fixed substep runs, in order:
//!
//! 1. force integration (gravity, accumulated forces, damping)
//! 2. contact detection: every body pair plus the ground plane
//! 3. contact solving (velocity iterations)
//! 4. position integration
//! 5. position correction
//! 6. bias-free velocity relaxation
//!
//! Solving velocities before moving bodies keeps resting contacts from
//! gaining energy.

use hashbrown::HashMap;
use impulse_contact::{collide, collide_ground, Contact, ContactSolver, WarmStartCache};
use impulse_types::{
    BodyArena, BodyHandle, GroundPlane, PhysicsError, Point3, Pose, Result, RigidBody, Shape,
    Vector3, WorldConfig,
};

use crate::export::{write_pose, RenderTransform};
use crate::stepper::{FixedTimestep, StepStats};

/// Rigid-body world advanced with a fixed timestep.
///
/// # Example
///
/// ```
/// use impulse_core::World;
/// use impulse_types::Pose;
///
/// let mut world = World::default();
/// let ball = world
///     .create_sphere(0.5, 1.0, Pose::from_xyz(0.0, 0.0, 2.0), false)
///     .unwrap();
///
/// for _ in 0..120 {
///     world.step(1.0 / 60.0);
/// }
///
/// // Dropped 1.5 m onto the ground plane and settled there.
/// let z = world.pose(ball).unwrap().position.z;
/// assert!((z - 0.5).abs() < 0.05);
/// ```
#[derive(Debug, Clone)]
pub struct World {
    /// Simulation parameters, read at the start of every step.
    config: WorldConfig,
    /// Body storage.
    bodies: BodyArena,
    /// Body name to handle mapping.
    body_names: HashMap<String, BodyHandle>,
    /// Contact solver, reused across substeps.
    solver: ContactSolver,
    /// Contacts of the most recent substep.
    contacts: Vec<Contact>,
    /// Impulses carried between substeps when enabled.
    warm_start: WarmStartCache,
    /// Frame-time accumulator.
    timestep: FixedTimestep,
    /// Simulated time.
    time: f64,
    /// Fixed substeps run so far.
    substep_count: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            solver: ContactSolver::new(config.solver.clone()),
            config,
            bodies: BodyArena::new(),
            body_names: HashMap::new(),
            contacts: Vec::new(),
            warm_start: WarmStartCache::new(),
            timestep: FixedTimestep::new(),
            time: 0.0,
            substep_count: 0,
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Mutable access to the configuration. Changes apply from the next step.
    pub fn config_mut(&mut self) -> &mut WorldConfig {
        &mut self.config
    }

    /// Set the gravitational acceleration.
    pub fn set_gravity(&mut self, gravity: Vector3<f64>) {
        tracing::debug!(?gravity, "set gravity");
        self.config.gravity.acceleration = gravity;
    }

    /// Set the fixed substep length.
    pub fn set_fixed_dt(&mut self, fixed_dt: f64) {
        tracing::debug!(fixed_dt, "set fixed timestep");
        self.config.fixed_dt = fixed_dt;
    }

    /// Set the maximum number of substeps per [`step`](Self::step).
    pub fn set_max_substeps(&mut self, max_substeps: usize) {
        tracing::debug!(max_substeps, "set max substeps");
        self.config.max_substeps = max_substeps;
    }

    /// Set the restitution coefficient used by every contact.
    pub fn set_restitution(&mut self, restitution: f64) {
        tracing::debug!(restitution, "set restitution");
        self.config.restitution = restitution;
    }

    /// Set the friction coefficient used by every contact.
    pub fn set_friction(&mut self, friction: f64) {
        tracing::debug!(friction, "set friction");
        self.config.friction = friction;
    }

    /// Set the number of solver velocity iterations.
    pub fn set_solver_iterations(&mut self, iterations: usize) {
        tracing::debug!(iterations, "set solver iterations");
        self.config.solver.iterations = iterations;
    }

    /// Enable or disable the ground plane and set its height.
    pub fn set_ground(&mut self, enabled: bool, height: f64) {
        tracing::debug!(enabled, height, "set ground plane");
        self.config.ground = GroundPlane { enabled, height };
    }

    // =========================================================================
    // Body Management
    // =========================================================================

    /// Add a box with full side lengths `size`.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBodyConfig`] for a negative or
    /// non-finite mass or size.
    pub fn create_box(
        &mut self,
        size: Vector3<f64>,
        mass: f64,
        pose: Pose,
        is_static: bool,
    ) -> Result<BodyHandle> {
        self.create_body(Shape::cuboid(size), mass, pose, is_static)
    }

    /// Add a sphere.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBodyConfig`] for a negative or
    /// non-finite mass or radius.
    pub fn create_sphere(
        &mut self,
        radius: f64,
        mass: f64,
        pose: Pose,
        is_static: bool,
    ) -> Result<BodyHandle> {
        self.create_body(Shape::sphere(radius), mass, pose, is_static)
    }

    /// Add a capsule whose inner segment runs along its local Z axis.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBodyConfig`] for a negative or
    /// non-finite mass, half-length or radius.
    pub fn create_capsule(
        &mut self,
        half_length: f64,
        radius: f64,
        mass: f64,
        pose: Pose,
        is_static: bool,
    ) -> Result<BodyHandle> {
        self.create_body(Shape::capsule(half_length, radius), mass, pose, is_static)
    }

    fn create_body(
        &mut self,
        shape: Shape,
        mass: f64,
        pose: Pose,
        is_static: bool,
    ) -> Result<BodyHandle> {
        let mut body = RigidBody::new(shape, mass, pose);
        body.is_static = is_static;
        self.add_body(body)
    }

    /// Add a fully described body.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBodyConfig`] if the body fails
    /// [`RigidBody::validate`].
    pub fn add_body(&mut self, body: RigidBody) -> Result<BodyHandle> {
        body.validate()?;
        let name = body.name.clone();
        let handle = self.bodies.insert(body);
        if let Some(name) = name {
            self.body_names.insert(name, handle);
        }
        tracing::debug!(%handle, bodies = self.bodies.len(), "body added");
        Ok(handle)
    }

    /// Remove a body. Its handle becomes stale.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `handle` is stale or unknown.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        let body = self
            .bodies
            .remove(handle)
            .ok_or_else(|| PhysicsError::invalid_body(handle))?;
        if let Some(name) = &body.name {
            if self.body_names.get(name) == Some(&handle) {
                self.body_names.remove(name);
            }
        }
        self.contacts.retain(|c| !c.involves(handle));
        tracing::debug!(%handle, bodies = self.bodies.len(), "body removed");
        Ok(body)
    }

    /// Remove every body and contact and reset the accumulator.
    ///
    /// Simulated time and the substep counter are kept.
    pub fn clear(&mut self) {
        tracing::debug!(bodies = self.bodies.len(), "world cleared");
        self.bodies.clear();
        self.body_names.clear();
        self.contacts.clear();
        self.warm_start.clear();
        self.timestep.reset();
    }

    /// Get a body by handle.
    #[must_use]
    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    /// Get a mutable reference to a body by handle.
    #[must_use]
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    /// Handle of the body registered under `name`.
    #[must_use]
    pub fn handle_by_name(&self, name: &str) -> Option<BodyHandle> {
        self.body_names
            .get(name)
            .copied()
            .filter(|h| self.bodies.contains(*h))
    }

    /// Get a body by name.
    #[must_use]
    pub fn body_by_name(&self, name: &str) -> Option<&RigidBody> {
        self.handle_by_name(name).and_then(|h| self.bodies.get(h))
    }

    /// Whether `handle` refers to a live body.
    #[must_use]
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    /// Number of live bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Handles of all live bodies, in storage order.
    #[must_use]
    pub fn handles(&self) -> Vec<BodyHandle> {
        self.bodies.handles()
    }

    /// Iterate over live bodies in storage order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter()
    }

    fn get(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.bodies
            .get(handle)
            .ok_or_else(|| PhysicsError::invalid_body(handle))
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody> {
        self.bodies
            .get_mut(handle)
            .ok_or_else(|| PhysicsError::invalid_body(handle))
    }

    // =========================================================================
    // Body State
    // =========================================================================

    /// Pose of a body.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `handle` is stale or unknown.
    pub fn pose(&self, handle: BodyHandle) -> Result<Pose> {
        self.get(handle).map(|b| b.pose)
    }

    /// Linear velocity of a body.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `handle` is stale or unknown.
    pub fn linear_velocity(&self, handle: BodyHandle) -> Result<Vector3<f64>> {
        self.get(handle).map(|b| b.linear_velocity)
    }

    /// Angular velocity of a body.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `handle` is stale or unknown.
    pub fn angular_velocity(&self, handle: BodyHandle) -> Result<Vector3<f64>> {
        self.get(handle).map(|b| b.angular_velocity)
    }

    /// Teleport a body.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `handle` is stale or unknown.
    pub fn set_pose(&mut self, handle: BodyHandle, pose: Pose) -> Result<()> {
        self.get_mut(handle)?.pose = pose;
        Ok(())
    }

    /// Overwrite a body's linear velocity.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `handle` is stale or unknown.
    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vector3<f64>) -> Result<()> {
        self.get_mut(handle)?.linear_velocity = velocity;
        Ok(())
    }

    /// Overwrite a body's angular velocity.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `handle` is stale or unknown.
    pub fn set_angular_velocity(
        &mut self,
        handle: BodyHandle,
        velocity: Vector3<f64>,
    ) -> Result<()> {
        self.get_mut(handle)?.angular_velocity = velocity;
        Ok(())
    }

    /// Accumulate a force at a body's center of mass until the next substep.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `handle` is stale or unknown.
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vector3<f64>) -> Result<()> {
        self.get_mut(handle)?.apply_force(force);
        Ok(())
    }

    /// Accumulate a torque on a body until the next substep.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `handle` is stale or unknown.
    pub fn apply_torque(&mut self, handle: BodyHandle, torque: Vector3<f64>) -> Result<()> {
        self.get_mut(handle)?.apply_torque(torque);
        Ok(())
    }

    /// Apply an instantaneous impulse at a world-space point.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `handle` is stale or unknown.
    pub fn apply_impulse_at_point(
        &mut self,
        handle: BodyHandle,
        impulse: Vector3<f64>,
        point: Point3<f64>,
    ) -> Result<()> {
        self.get_mut(handle)?.apply_impulse_at_point(&impulse, &point);
        Ok(())
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Advance the simulation by `dt` seconds of frame time.
    ///
    /// Runs as many fixed substeps as the accumulator allows, capped at
    /// `max_substeps`. A non-finite or negative `dt` counts as zero.
    pub fn step(&mut self, dt: f64) -> StepStats {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            tracing::warn!(dt, "ignoring invalid step duration");
            0.0
        };
        let fixed_dt = self.config.fixed_dt;
        if !(fixed_dt.is_finite() && fixed_dt > 0.0) {
            tracing::warn!(fixed_dt, "fixed timestep must be positive; not stepping");
            return StepStats {
                contacts: self.contacts.len(),
                ..StepStats::default()
            };
        }

        let plan = self
            .timestep
            .advance(dt, fixed_dt, self.config.max_substeps);
        for _ in 0..plan.substeps {
            self.step_fixed(fixed_dt);
        }
        if plan.dropped_time > 0.0 {
            tracing::warn!(
                dropped = plan.dropped_time,
                max_substeps = self.config.max_substeps,
                "simulation fell behind; discarding accumulated time"
            );
        }

        StepStats {
            substeps: plan.substeps,
            contacts: self.contacts.len(),
            dropped_time: plan.dropped_time,
        }
    }

    /// Run exactly one substep of length `dt`, bypassing the accumulator.
    pub fn step_fixed(&mut self, dt: f64) {
        if !(dt.is_finite() && dt > 0.0) {
            tracing::warn!(dt, "ignoring invalid substep duration");
            return;
        }
        if self.solver.config() != &self.config.solver {
            self.solver.set_config(self.config.solver.clone());
        }

        let gravity = self.config.gravity.acceleration;
        for (_, body) in self.bodies.iter_mut() {
            body.integrate_forces(dt, &gravity);
        }

        self.detect_contacts();

        let solver_config = &self.config.solver;
        if solver_config.warm_start_across_substeps {
            self.warm_start.apply(
                &mut self.contacts,
                solver_config.warm_start_distance,
                solver_config.warm_start_factor,
            );
        }
        self.solver.prepare(
            &self.contacts,
            &self.bodies,
            dt,
            self.config.restitution,
            self.config.friction,
        );
        self.solver.solve(&mut self.contacts, &mut self.bodies);

        for (_, body) in self.bodies.iter_mut() {
            body.integrate_positions(dt);
        }

        self.solver.solve_positions(&self.contacts, &mut self.bodies);
        self.solver.relax(&mut self.contacts, &mut self.bodies);

        if self.config.solver.warm_start_across_substeps {
            self.warm_start.store(&self.contacts);
        } else if !self.warm_start.is_empty() {
            self.warm_start.clear();
        }

        self.time += dt;
        self.substep_count += 1;
        tracing::trace!(
            substep = self.substep_count,
            bodies = self.bodies.len(),
            contacts = self.contacts.len(),
            "fixed substep"
        );
    }

    /// Rebuild the contact list from the current poses.
    ///
    /// Pairs where neither body is dynamic are skipped, as are pairs whose
    /// collision masks exclude each other.
    fn detect_contacts(&mut self) {
        self.contacts.clear();
        let bodies = &self.bodies;
        let contacts = &mut self.contacts;

        for (i, (handle_a, a)) in bodies.iter().enumerate() {
            for (handle_b, b) in bodies.iter().skip(i + 1) {
                if !(a.is_dynamic() || b.is_dynamic()) || !a.can_collide_with(b) {
                    continue;
                }
                let reach = a.shape.bounding_radius() + b.shape.bounding_radius();
                if (b.pose.position - a.pose.position).norm_squared() > reach * reach {
                    continue;
                }
                contacts.extend(
                    collide(&a.shape, &a.pose, &b.shape, &b.pose)
                        .iter()
                        .map(|p| Contact::between(handle_a, handle_b, p)),
                );
            }
        }

        let ground = self.config.ground;
        if ground.enabled {
            for (handle, body) in bodies.iter().filter(|(_, b)| b.is_dynamic()) {
                contacts.extend(
                    collide_ground(&body.shape, &body.pose, ground.height)
                        .iter()
                        .map(|p| Contact::with_ground(handle, p)),
                );
            }
        }
    }

    // =========================================================================
    // Read-back
    // =========================================================================

    /// Contacts of the most recent substep. Valid until the next step.
    #[must_use]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Simulated time in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Total fixed substeps run.
    #[must_use]
    pub fn substep_count(&self) -> u64 {
        self.substep_count
    }

    /// Frame time accumulated but not yet simulated.
    #[must_use]
    pub fn time_accumulator(&self) -> f64 {
        self.timestep.accumulator()
    }

    /// Sum of kinetic energy over all dynamic bodies.
    #[must_use]
    pub fn total_kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(|(_, b)| b.kinetic_energy()).sum()
    }

    /// Write every body's pose into `out` as `[px, py, pz, qx, qy, qz, qw]`,
    /// in storage order. `out` is cleared first.
    pub fn write_transforms(&self, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(self.bodies.len() * crate::export::TRANSFORM_STRIDE);
        for (_, body) in self.bodies.iter() {
            write_pose(&body.pose, out);
        }
    }

    /// Body poses in renderer precision, in storage order.
    #[must_use]
    pub fn render_transforms(&self) -> Vec<RenderTransform> {
        self.bodies
            .iter()
            .map(|(handle, body)| RenderTransform::new(handle, &body.pose))
            .collect()
    }
}
