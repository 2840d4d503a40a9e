//! Configuration for the world and its contact solver.
//!
//! All values are plain fields. The world reads them at the start of every
//! step, so changing a field between steps takes effect immediately.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{PhysicsError, Result};

/// Uniform gravitational field.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gravity {
    /// Acceleration (m/s²), world frame.
    pub acceleration: Vector3<f64>,
}

impl Default for Gravity {
    fn default() -> Self {
        Self::earth()
    }
}

impl Gravity {
    /// Standard Earth gravity along -Z.
    #[must_use]
    pub fn earth() -> Self {
        Self::custom(Vector3::new(0.0, 0.0, -9.81))
    }

    /// No gravity.
    #[must_use]
    pub fn zero() -> Self {
        Self::custom(Vector3::zeros())
    }

    /// Arbitrary acceleration vector.
    #[must_use]
    pub const fn custom(acceleration: Vector3<f64>) -> Self {
        Self { acceleration }
    }
}

/// Infinite horizontal ground plane with normal +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroundPlane {
    /// Whether bodies collide with the plane.
    pub enabled: bool,
    /// Plane height along Z.
    pub height: f64,
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self {
            enabled: true,
            height: 0.0,
        }
    }
}

impl GroundPlane {
    /// Enabled plane at `height`.
    #[must_use]
    pub const fn at(height: f64) -> Self {
        Self {
            enabled: true,
            height,
        }
    }

    /// No ground.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            height: 0.0,
        }
    }
}

/// Sequential-impulse solver parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig {
    /// Velocity iterations per substep.
    pub iterations: usize,
    /// Fraction of penetration (beyond slop) fed back as velocity bias per step.
    pub baumgarte: f64,
    /// Penetration tolerated without correction (m).
    pub slop: f64,
    /// Cap on the Baumgarte bias velocity (m/s).
    pub max_bias_velocity: f64,
    /// Fraction of penetration (beyond slop) removed by the position pass.
    pub position_correction: f64,
    /// Cap on the position-pass correction of one contact per substep (m).
    pub max_position_correction: f64,
    /// Bias-free velocity iterations run after the position pass.
    pub relax_iterations: usize,
    /// Approach speed above which restitution applies (m/s).
    pub restitution_threshold: f64,
    /// Tangential speed below which friction impulses are skipped (m/s).
    pub friction_velocity_threshold: f64,
    /// Carry accumulated impulses from one substep to the next.
    pub warm_start_across_substeps: bool,
    /// Maximum distance between contact points matched across substeps (m).
    pub warm_start_distance: f64,
    /// Scale applied to carried impulses.
    pub warm_start_factor: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            baumgarte: 0.2,
            slop: 0.005,
            max_bias_velocity: 1.0,
            position_correction: 0.4,
            max_position_correction: 0.01,
            relax_iterations: 4,
            restitution_threshold: 1.0,
            friction_velocity_threshold: 0.01,
            warm_start_across_substeps: false,
            warm_start_distance: 0.02,
            warm_start_factor: 1.0,
        }
    }
}

impl SolverConfig {
    /// Fewer iterations, for cheap scenes.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            iterations: 4,
            relax_iterations: 2,
            ..Default::default()
        }
    }

    /// More iterations with cross-substep warm starting.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            iterations: 20,
            relax_iterations: 8,
            warm_start_across_substeps: true,
            ..Default::default()
        }
    }

    /// Set the iteration count.
    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the Baumgarte factor.
    #[must_use]
    pub fn baumgarte(mut self, baumgarte: f64) -> Self {
        self.baumgarte = baumgarte;
        self
    }

    /// Set the allowed penetration.
    #[must_use]
    pub fn slop(mut self, slop: f64) -> Self {
        self.slop = slop;
        self
    }

    /// Set the position-pass correction factor.
    #[must_use]
    pub fn position_correction(mut self, factor: f64) -> Self {
        self.position_correction = factor;
        self
    }

    /// Set the bias velocity cap.
    #[must_use]
    pub fn max_bias_velocity(mut self, speed: f64) -> Self {
        self.max_bias_velocity = speed;
        self
    }

    /// Set the per-substep position correction cap.
    #[must_use]
    pub fn max_position_correction(mut self, distance: f64) -> Self {
        self.max_position_correction = distance;
        self
    }

    /// Set the number of bias-free iterations after the position pass.
    #[must_use]
    pub fn relax_iterations(mut self, iterations: usize) -> Self {
        self.relax_iterations = iterations;
        self
    }

    /// Enable or disable warm starting across substeps.
    #[must_use]
    pub fn warm_start_across_substeps(mut self, enabled: bool) -> Self {
        self.warm_start_across_substeps = enabled;
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(PhysicsError::invalid_config(
                "solver iterations must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.baumgarte) {
            return Err(PhysicsError::invalid_config(format!(
                "baumgarte must be in [0, 1], got {}",
                self.baumgarte
            )));
        }
        if !(0.0..=1.0).contains(&self.position_correction) {
            return Err(PhysicsError::invalid_config(format!(
                "position_correction must be in [0, 1], got {}",
                self.position_correction
            )));
        }
        if !(0.0..=1.0).contains(&self.warm_start_factor) {
            return Err(PhysicsError::invalid_config(format!(
                "warm_start_factor must be in [0, 1], got {}",
                self.warm_start_factor
            )));
        }
        for (name, value) in [
            ("slop", self.slop),
            ("max_bias_velocity", self.max_bias_velocity),
            ("max_position_correction", self.max_position_correction),
            ("restitution_threshold", self.restitution_threshold),
            ("friction_velocity_threshold", self.friction_velocity_threshold),
            ("warm_start_distance", self.warm_start_distance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PhysicsError::invalid_config(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// World-level simulation parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// Gravity applied to every dynamic body.
    pub gravity: Gravity,
    /// Fixed substep length (s).
    pub fixed_dt: f64,
    /// Upper bound on substeps per `step` call.
    pub max_substeps: usize,
    /// Coefficient of restitution for every contact.
    pub restitution: f64,
    /// Coulomb friction coefficient for every contact.
    pub friction: f64,
    /// Ground plane.
    pub ground: GroundPlane,
    /// Contact solver parameters.
    pub solver: SolverConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Gravity::earth(),
            fixed_dt: 1.0 / 240.0,
            max_substeps: 8,
            restitution: 0.0,
            friction: 0.5,
            ground: GroundPlane::default(),
            solver: SolverConfig::default(),
        }
    }
}

impl WorldConfig {
    /// 60 Hz stepping for interactive use.
    #[must_use]
    pub fn realtime() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_substeps: 4,
            ..Default::default()
        }
    }

    /// 1 kHz stepping with a more thorough solver.
    #[must_use]
    pub fn high_fidelity() -> Self {
        Self {
            fixed_dt: 1.0 / 1000.0,
            max_substeps: 32,
            solver: SolverConfig::default().iterations(20),
            ..Default::default()
        }
    }

    /// Set gravity.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the fixed substep length.
    #[must_use]
    pub fn with_fixed_dt(mut self, fixed_dt: f64) -> Self {
        self.fixed_dt = fixed_dt;
        self
    }

    /// Set the substep cap.
    #[must_use]
    pub fn with_max_substeps(mut self, max_substeps: usize) -> Self {
        self.max_substeps = max_substeps;
        self
    }

    /// Set the restitution coefficient.
    #[must_use]
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set the friction coefficient.
    #[must_use]
    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    /// Set the ground plane.
    #[must_use]
    pub fn with_ground(mut self, ground: GroundPlane) -> Self {
        self.ground = ground;
        self
    }

    /// Set the solver parameters.
    #[must_use]
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Check parameter ranges.
    ///
    /// The world never calls this itself: stepping tolerates any values.
    pub fn validate(&self) -> Result<()> {
        if !self.fixed_dt.is_finite() || self.fixed_dt <= 0.0 {
            return Err(PhysicsError::invalid_config(format!(
                "fixed_dt must be positive, got {}",
                self.fixed_dt
            )));
        }
        if self.max_substeps == 0 {
            return Err(PhysicsError::invalid_config(
                "max_substeps must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(PhysicsError::invalid_config(format!(
                "restitution must be in [0, 1], got {}",
                self.restitution
            )));
        }
        if !self.friction.is_finite() || self.friction < 0.0 {
            return Err(PhysicsError::invalid_config(format!(
                "friction must be non-negative, got {}",
                self.friction
            )));
        }
        if !self.gravity.acceleration.iter().all(|g| g.is_finite()) {
            return Err(PhysicsError::invalid_config("gravity must be finite"));
        }
        if !self.ground.height.is_finite() {
            return Err(PhysicsError::invalid_config(
                "ground height must be finite",
            ));
        }
        self.solver.validate()
    }
}
