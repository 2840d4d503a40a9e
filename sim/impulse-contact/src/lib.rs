//! Contact detection and resolution for the impulse rigid-body engine.
//!
//! - [`narrow`]: pure shape-pair detectors producing a [`Manifold`] of
//!   [`ManifoldPoint`]s, dispatched by [`collide`] and [`collide_ground`]
//! - [`Contact`]: a manifold point bound to a body pair (or body and ground),
//!   carrying the solver's accumulated impulses
//! - [`ContactSolver`]: sequential impulses with Coulomb friction, restitution,
//!   Baumgarte bias and a position correction pass
//! - [`WarmStartCache`]: optional impulse carry-over between substeps
//!
//! # Example
//!
//! ```
//! use impulse_contact::{collide, Contact, ContactSolver};
//! use impulse_types::{BodyArena, Pose, RigidBody, Shape};
//! use nalgebra::Vector3;
//!
//! let mut bodies = BodyArena::new();
//! let a = bodies.insert(
//!     RigidBody::new(Shape::sphere(0.5), 1.0, Pose::identity())
//!         .with_linear_velocity(Vector3::new(1.0, 0.0, 0.0)),
//! );
//! let b = bodies.insert(RigidBody::new(
//!     Shape::sphere(0.5),
//!     1.0,
//!     Pose::from_xyz(0.995, 0.0, 0.0),
//! ));
//!
//! let (sa, pa) = (bodies.get(a).unwrap().shape, bodies.get(a).unwrap().pose);
//! let (sb, pb) = (bodies.get(b).unwrap().shape, bodies.get(b).unwrap().pose);
//! let mut contacts: Vec<Contact> = collide(&sa, &pa, &sb, &pb)
//!     .iter()
//!     .map(|p| Contact::between(a, b, p))
//!     .collect();
//!
//! let mut solver = ContactSolver::default();
//! solver.prepare(&contacts, &bodies, 1.0 / 240.0, 0.0, 0.5);
//! solver.solve(&mut contacts, &mut bodies);
//!
//! // Equal masses, inelastic: both end up moving together.
//! let va = bodies.get(a).unwrap().linear_velocity.x;
//! let vb = bodies.get(b).unwrap().linear_velocity.x;
//! assert!((va - vb).abs() < 1e-9);
//! ```

#![doc(html_root_url = "https://docs.rs/impulse-contact/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]

mod contact;
pub mod narrow;
mod solver;
mod warm_start;

pub use contact::{Contact, Manifold, ManifoldPoint};
pub use narrow::{collide, collide_ground};
pub use solver::{ContactConstraint, ContactSolver};
pub use warm_start::{WarmStartCache, NORMAL_AGREEMENT};
