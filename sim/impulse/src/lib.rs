//! Unified API for the impulse rigid-body simulator.
//!
//! This crate re-exports the simulation stack:
//!
//! - [`impulse_types`] - Poses, shapes, bodies, handles and configuration
//! - [`impulse_contact`] - Narrow-phase collision and the contact solver
//! - [`impulse_core`] - The fixed-timestep [`World`](impulse_core::World)
//!
//! Coordinates are right-handed with +Z up. All simulation math is `f64`;
//! poses are narrowed to `f32` only when exported for rendering.
//!
//! # Quick Start
//!
//! ```
//! use impulse::prelude::*;
//!
//! let mut world = World::new(WorldConfig::realtime());
//!
//! let crate_box = world
//!     .create_box(Vector3::new(1.0, 1.0, 1.0), 2.0, Pose::from_xyz(0.0, 0.0, 0.6), false)
//!     .unwrap();
//! let ball = world
//!     .create_sphere(0.25, 0.5, Pose::from_xyz(0.0, 0.0, 3.0), false)
//!     .unwrap();
//!
//! for _ in 0..60 {
//!     world.step(1.0 / 60.0);
//! }
//!
//! // Read poses back for rendering.
//! let mut transforms = Vec::new();
//! world.write_transforms(&mut transforms);
//! assert_eq!(transforms.len(), 2 * TRANSFORM_STRIDE);
//! assert!(world.pose(crate_box).unwrap().position.z > 0.4);
//! assert!(world.contains(ball));
//! ```
//!
//! # Architecture
//!
//! ```text
//!          ┌──────────────────────────────┐
//!          │      impulse (this crate)    │
//!          │   Unified API / re-exports   │
//!          └──────────────┬───────────────┘
//!                         ▼
//!               ┌──────────────────┐
//!               │   impulse-core   │
//!               │ World, stepping  │
//!               └────────┬─────────┘
//!                        ▼
//!               ┌──────────────────┐
//!               │ impulse-contact  │
//!               │ Narrow phase, SI │
//!               └────────┬─────────┘
//!                        ▼
//!               ┌──────────────────┐
//!               │  impulse-types   │
//!               │   Data structs   │
//!               └──────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/impulse/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

// Re-export sub-crates
pub use impulse_contact;
pub use impulse_core;
pub use impulse_types;

// Re-export nalgebra for convenience
pub use nalgebra;

/// Prelude module for convenient imports.
///
/// ```
/// use impulse::prelude::*;
/// ```
pub mod prelude {
    // ========================================================================
    // Core types from impulse-types
    // ========================================================================

    pub use impulse_types::{
        BodyHandle, MassProperties, Point3, Pose, RigidBody, Shape, UnitQuaternion, Vector3,
    };

    // Configuration
    pub use impulse_types::{Gravity, GroundPlane, SolverConfig, WorldConfig};

    // Errors
    pub use impulse_types::{PhysicsError, Result};

    // ========================================================================
    // Collision and contacts from impulse-contact
    // ========================================================================

    pub use impulse_contact::{collide, collide_ground, Contact, ContactSolver, ManifoldPoint};

    // ========================================================================
    // World from impulse-core
    // ========================================================================

    pub use impulse_core::{RenderTransform, StepStats, World, TRANSFORM_STRIDE};
}
