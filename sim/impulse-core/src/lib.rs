//! Fixed-timestep rigid-body world for the impulse engine.
//!
//! [`World`] owns the bodies, advances them in fixed substeps through an
//! accumulator with a catch-up guard, and exposes poses, velocities and the
//! latest contact list after each [`World::step`].
//!
//! # Example
//!
//! ```
//! use impulse_core::World;
//! use impulse_types::{Pose, Vector3};
//!
//! let mut world = World::default();
//! world.set_restitution(0.0);
//!
//! let falling = world
//!     .create_box(Vector3::new(1.0, 1.0, 1.0), 1.0, Pose::from_xyz(0.0, 0.0, 3.0), false)
//!     .unwrap();
//!
//! let stats = world.step(1.0 / 60.0);
//! assert!(stats.substeps >= 3);
//! assert!(world.linear_velocity(falling).unwrap().z < 0.0);
//! ```

#![doc(html_root_url = "https://docs.rs/impulse-core/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]

pub mod export;
mod stepper;
mod world;

pub use export::{RenderTransform, TRANSFORM_STRIDE};
pub use stepper::{FixedTimestep, StepStats, SubstepPlan};
pub use world::World;

pub use impulse_contact::{Contact, ManifoldPoint};
pub use impulse_types::{BodyHandle, PhysicsError, Pose, Result, RigidBody, Shape, WorldConfig};
