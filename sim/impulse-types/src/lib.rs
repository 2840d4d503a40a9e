//! Core data types for the impulse rigid-body engine.
//!
//! This crate holds the pure data layer of the engine:
//!
//! - [`Pose`] and vector helpers on top of `nalgebra`
//! - [`Shape`] and [`MassProperties`]
//! - [`RigidBody`] with its own force integration and impulse response
//! - [`BodyArena`] / [`BodyHandle`], generation-checked body storage
//! - [`WorldConfig`], [`SolverConfig`], [`Gravity`], [`GroundPlane`]
//! - [`PhysicsError`]
//!
//! Coordinates are right-handed with Z up. All quantities are SI and `f64`.
//!
//! # Example
//!
//! ```
//! use impulse_types::{BodyArena, Pose, RigidBody, Shape};
//!
//! let mut arena = BodyArena::new();
//! let handle = arena.insert(RigidBody::new(
//!     Shape::sphere(0.5),
//!     1.0,
//!     Pose::from_xyz(0.0, 0.0, 2.0),
//! ));
//!
//! assert!(arena.get(handle).is_some());
//! arena.remove(handle);
//! assert!(arena.get(handle).is_none());
//! ```

#![doc(html_root_url = "https://docs.rs/impulse-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]

mod arena;
mod body;
mod config;
mod error;
pub mod math;
mod pose;
mod shape;

pub use arena::{BodyArena, BodyHandle};
pub use body::{RigidBody, MASS_EPSILON};
pub use config::{Gravity, GroundPlane, SolverConfig, WorldConfig};
pub use error::PhysicsError;
pub use pose::Pose;
pub use shape::{MassProperties, Shape};

// Re-export the math types that appear in public signatures.
pub use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};

/// Result type for fallible engine operations.
pub type Result<T> = std::result::Result<T, PhysicsError>;
