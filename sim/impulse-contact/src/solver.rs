//! Sequential-impulse contact solver.
//!
//! Each substep runs `prepare` → `solve` → (bodies integrate) →
//! `solve_positions` → `relax`:
//!
//! 1. **prepare** caches effective masses and a tangent basis per contact.
//! 2. **solve** runs a fixed number of iterations. Each iteration resolves
//!    the normal impulse (with restitution or Baumgarte bias) and then the
//!    two friction impulses of every contact in order.
//! 3. **solve_positions** nudges positions along the contact normals to
//!    remove penetration the velocity pass left behind.
//! 4. **relax** repeats the velocity iterations without bias. The bias
//!    velocity has already moved the bodies apart, and keeping it would
//!    carry into the next substep as kinetic energy.
//!
//! Bias velocity and per-substep position correction are both capped, so
//! deep overlaps resolve over several substeps instead of launching bodies.
//!
//! Impulses are accumulated per contact and clamped on the accumulated value,
//! so later iterations can take back what earlier ones over-applied. The
//! iteration count is fixed, which keeps the result deterministic.

use hashbrown::HashMap;
use impulse_types::math::tangent_basis;
use impulse_types::{BodyArena, BodyHandle, RigidBody, SolverConfig, MASS_EPSILON};
use nalgebra::{Point3, Vector3};

use crate::Contact;

/// Per-contact data cached by [`ContactSolver::prepare`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactConstraint {
    /// Effective mass along the contact normal.
    pub normal_mass: f64,
    /// Effective mass along the first tangent.
    pub tangent_mass_1: f64,
    /// Effective mass along the second tangent.
    pub tangent_mass_2: f64,
    /// First friction direction.
    pub tangent_1: Vector3<f64>,
    /// Second friction direction.
    pub tangent_2: Vector3<f64>,
    /// Normal relative velocity seen by the first iteration.
    pub initial_normal_velocity: Option<f64>,
}

/// Sequential-impulse solver for a batch of contacts.
#[derive(Debug, Clone)]
pub struct ContactSolver {
    config: SolverConfig,
    restitution: f64,
    friction: f64,
    dt: f64,
    constraints: Vec<ContactConstraint>,
    displacements: HashMap<BodyHandle, Vector3<f64>>,
}

impl Default for ContactSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

fn body(bodies: &BodyArena, handle: Option<BodyHandle>) -> Option<&RigidBody> {
    handle.and_then(|h| bodies.get(h))
}

/// Inverse mass seen by an impulse along `dir` applied at `point`.
fn inverse_mass_along(body: Option<&RigidBody>, point: &Point3<f64>, dir: &Vector3<f64>) -> f64 {
    body.map_or(0.0, |b| {
        let r = point - b.pose.position;
        let rn = r.cross(dir);
        b.inv_mass() + (b.world_inertia_inv() * rn).dot(&rn)
    })
}

fn effective_mass(w: f64) -> f64 {
    if w > MASS_EPSILON {
        1.0 / w
    } else {
        0.0
    }
}

fn point_velocity(body: Option<&RigidBody>, point: &Point3<f64>) -> Vector3<f64> {
    body.map_or_else(Vector3::zeros, |b| b.velocity_at_point(point))
}

fn linear_velocity(body: Option<&RigidBody>) -> Vector3<f64> {
    body.map_or_else(Vector3::zeros, |b| b.linear_velocity)
}

/// Relative velocity of B with respect to A at the contact point.
fn relative_velocity(bodies: &BodyArena, contact: &Contact) -> Vector3<f64> {
    point_velocity(body(bodies, Some(contact.body_b)), &contact.point)
        - point_velocity(body(bodies, contact.body_a), &contact.point)
}

/// Apply `impulse` to B and its opposite to A.
fn apply_impulse(bodies: &mut BodyArena, contact: &Contact, impulse: &Vector3<f64>) {
    if let Some(b) = bodies.get_mut(contact.body_b) {
        b.apply_impulse_at_point(impulse, &contact.point);
    }
    if let Some(a) = contact.body_a.and_then(|h| bodies.get_mut(h)) {
        a.apply_impulse_at_point(&-impulse, &contact.point);
    }
}

impl ContactSolver {
    /// Create a solver with the given parameters.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            restitution: 0.0,
            friction: 0.0,
            dt: 0.0,
            constraints: Vec::new(),
            displacements: HashMap::new(),
        }
    }

    /// Solver parameters.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Replace the solver parameters.
    pub fn set_config(&mut self, config: SolverConfig) {
        self.config = config;
    }

    /// Constraints cached by the last [`prepare`](Self::prepare).
    #[must_use]
    pub fn constraints(&self) -> &[ContactConstraint] {
        &self.constraints
    }

    /// Cache effective masses and tangent bases for `contacts`.
    ///
    /// Must run after velocities have been integrated and before any body
    /// moves, since the masses depend on the current orientations.
    pub fn prepare(
        &mut self,
        contacts: &[Contact],
        bodies: &BodyArena,
        dt: f64,
        restitution: f64,
        friction: f64,
    ) {
        self.dt = dt;
        self.restitution = restitution;
        self.friction = friction;
        self.constraints.clear();
        self.constraints.reserve(contacts.len());

        for contact in contacts {
            let a = body(bodies, contact.body_a);
            let b = body(bodies, Some(contact.body_b));
            let (tangent_1, tangent_2) = tangent_basis(&contact.normal);
            let mass_along = |dir: &Vector3<f64>| {
                effective_mass(
                    inverse_mass_along(a, &contact.point, dir)
                        + inverse_mass_along(b, &contact.point, dir),
                )
            };
            self.constraints.push(ContactConstraint {
                normal_mass: mass_along(&contact.normal),
                tangent_mass_1: mass_along(&tangent_1),
                tangent_mass_2: mass_along(&tangent_2),
                tangent_1,
                tangent_2,
                initial_normal_velocity: None,
            });
        }
    }

    /// Re-apply impulses already stored on the contacts.
    ///
    /// Accumulators are zero for freshly detected contacts, making this a
    /// no-op unless impulses were carried over from a previous substep.
    pub fn warm_start(&self, contacts: &[Contact], bodies: &mut BodyArena) {
        for (contact, constraint) in contacts.iter().zip(&self.constraints) {
            let impulse = contact.impulse(&constraint.tangent_1, &constraint.tangent_2);
            if impulse.norm_squared() > 0.0 {
                apply_impulse(bodies, contact, &impulse);
            }
        }
    }

    /// Warm start, then run the configured number of velocity iterations.
    pub fn solve(&mut self, contacts: &mut [Contact], bodies: &mut BodyArena) {
        let count = contacts.len().min(self.constraints.len());
        self.warm_start(&contacts[..count], bodies);

        for _ in 0..self.config.iterations {
            for (index, contact) in contacts[..count].iter_mut().enumerate() {
                self.update_normal(index, contact, bodies, true);
                self.solve_friction(index, contact, bodies);
            }
        }

        tracing::trace!(
            contacts = count,
            iterations = self.config.iterations,
            "contact velocity solve"
        );
    }

    /// Velocity iterations without Baumgarte bias, run after the position
    /// passes.
    ///
    /// Accumulated impulses keep building on what [`solve`](Self::solve)
    /// left, so impacts still target their reflected velocity. Resting
    /// contacts converge to zero approach speed.
    pub fn relax(&mut self, contacts: &mut [Contact], bodies: &mut BodyArena) {
        let count = contacts.len().min(self.constraints.len());
        for _ in 0..self.config.relax_iterations {
            for (index, contact) in contacts[..count].iter_mut().enumerate() {
                self.update_normal(index, contact, bodies, false);
                self.solve_friction(index, contact, bodies);
            }
        }
        tracing::trace!(
            contacts = count,
            iterations = self.config.relax_iterations,
            "contact relax"
        );
    }

    /// One normal-impulse update for the contact at `index`.
    ///
    /// Restitution applies when the approach speed seen on the first
    /// iteration exceeds the threshold. Such impacts target the reflected
    /// velocity without Baumgarte bias; the position pass removes their
    /// penetration instead. The bias velocity is capped at
    /// `max_bias_velocity`.
    pub fn solve_normal(&mut self, index: usize, contact: &mut Contact, bodies: &mut BodyArena) {
        self.update_normal(index, contact, bodies, true);
    }

    fn update_normal(
        &mut self,
        index: usize,
        contact: &mut Contact,
        bodies: &mut BodyArena,
        with_bias: bool,
    ) {
        let Some(constraint) = self.constraints.get_mut(index) else {
            return;
        };
        let vn = relative_velocity(bodies, contact).dot(&contact.normal);
        let initial = *constraint.initial_normal_velocity.get_or_insert(vn);

        let impact = initial < -self.config.restitution_threshold;
        let (target, bias) = if impact {
            (-self.restitution * initial, 0.0)
        } else if with_bias && self.dt > 0.0 {
            let error = (contact.penetration - self.config.slop).max(0.0);
            let bias = self.config.baumgarte * error / self.dt;
            (0.0, bias.min(self.config.max_bias_velocity))
        } else {
            (0.0, 0.0)
        };

        let lambda = constraint.normal_mass * (target - vn + bias);
        let old = contact.accumulated_normal_impulse;
        contact.accumulated_normal_impulse = (old + lambda).max(0.0);
        let delta = contact.accumulated_normal_impulse - old;
        if delta != 0.0 {
            apply_impulse(bodies, contact, &(contact.normal * delta));
        }
    }

    /// Friction impulses along both tangents for the contact at `index`.
    ///
    /// Uses the linear relative velocity only. Each tangential accumulator is
    /// clamped to `±friction · accumulated_normal_impulse`.
    pub fn solve_friction(&mut self, index: usize, contact: &mut Contact, bodies: &mut BodyArena) {
        let Some(constraint) = self.constraints.get(index).copied() else {
            return;
        };
        let limit = (self.friction * contact.accumulated_normal_impulse).max(0.0);

        let directions = [
            (constraint.tangent_1, constraint.tangent_mass_1),
            (constraint.tangent_2, constraint.tangent_mass_2),
        ];
        for (axis, (tangent, mass)) in directions.into_iter().enumerate() {
            let relative = linear_velocity(body(bodies, Some(contact.body_b)))
                - linear_velocity(body(bodies, contact.body_a));
            let vt = relative.dot(&tangent);
            if vt.abs() < self.config.friction_velocity_threshold {
                continue;
            }

            let accumulated = if axis == 0 {
                &mut contact.accumulated_tangent_impulse_1
            } else {
                &mut contact.accumulated_tangent_impulse_2
            };
            let old = *accumulated;
            *accumulated = (old - mass * vt).clamp(-limit, limit);
            let delta = *accumulated - old;
            if delta != 0.0 {
                apply_impulse(bodies, contact, &(tangent * delta));
            }
        }
    }

    /// Position correction pass, run after positions are integrated.
    ///
    /// Contacts are processed in order. Each estimates its remaining
    /// penetration from the stored depth, the relative normal velocity over
    /// the step, and the separation earlier contacts in this pass already
    /// produced, then splits the correction by inverse mass. A single
    /// contact moves its pair by at most `max_position_correction`.
    pub fn solve_positions(&mut self, contacts: &[Contact], bodies: &mut BodyArena) {
        self.displacements.clear();

        for contact in contacts {
            let a = body(bodies, contact.body_a);
            let b = body(bodies, Some(contact.body_b));
            let inv_a = a.map_or(0.0, RigidBody::inv_mass);
            let inv_b = b.map_or(0.0, RigidBody::inv_mass);
            let total = inv_a + inv_b;
            if total <= MASS_EPSILON {
                continue;
            }

            let vn = relative_velocity(bodies, contact).dot(&contact.normal);
            let shift_of = |handle: Option<BodyHandle>| {
                handle
                    .and_then(|h| self.displacements.get(&h).copied())
                    .unwrap_or_else(Vector3::zeros)
            };
            let applied = (shift_of(Some(contact.body_b)) - shift_of(contact.body_a))
                .dot(&contact.normal);
            let remaining = contact.penetration - vn * self.dt - applied;
            let correction = ((remaining - self.config.slop).max(0.0)
                * self.config.position_correction)
                .min(self.config.max_position_correction);
            if correction <= 0.0 {
                continue;
            }

            let shift = contact.normal * (correction / total);
            if inv_b > 0.0 {
                if let Some(b) = bodies.get_mut(contact.body_b) {
                    b.pose.position += shift * inv_b;
                }
                *self
                    .displacements
                    .entry(contact.body_b)
                    .or_insert_with(Vector3::zeros) += shift * inv_b;
            }
            if let Some(handle) = contact.body_a.filter(|_| inv_a > 0.0) {
                if let Some(a) = bodies.get_mut(handle) {
                    a.pose.position -= shift * inv_a;
                }
                *self
                    .displacements
                    .entry(handle)
                    .or_insert_with(Vector3::zeros) -= shift * inv_a;
            }
        }
    }
}
