//! Rein Physics
//!
//! A deterministic, fixed-step rigid-body physics core: a SPOOK projected
//! Gauss-Seidel constraint solver, narrowphase contact generation for
//! sphere/plane/box shapes, a naive broadphase, and a contact-history
//! matrix distinguishing first-contact impulses from persistent-contact
//! constraints.
//!
//! # Architecture
//!
//! 1. **math** - vector/matrix helpers the solver and narrowphase share
//! 2. **shape** - the collision shape catalogue and inertia formulas
//! 3. **body** - the detached rigid-body record, pre-attach state
//! 4. **contact** - per-contact data and the contact-history matrix
//! 5. **broadphase** - O(N^2) candidate-pair generation
//! 6. **narrowphase** - sphere/sphere, sphere/plane, box/plane contact tests
//! 7. **solver** - the first-contact impulse handler and the SPOOK solver
//! 8. **world** - Structure-of-Arrays body storage and the step driver
//! 9. **sleep** - optional supplemental sleep-state bookkeeping (feature = "sleeping")
//! 10. **error** - the crate's typed error enum
//!
//! This crate has no rendering, windowing, or ECS layer — it is the
//! simulation core only.

pub mod body;
pub mod broadphase;
pub mod contact;
pub mod error;
pub mod math;
pub mod narrowphase;
pub mod shape;
pub mod solver;
pub mod world;

#[cfg(feature = "sleeping")]
pub mod sleep;

pub use body::RigidBody;
pub use broadphase::{Broadphase, BroadphaseBody, NaiveBroadphase};
pub use contact::{Contact, ContactHistory};
pub use error::PhysicsError;
pub use narrowphase::Pose;
pub use shape::Shape;
pub use solver::{ConstraintRow, SolverScratch, SpookParams};
pub use world::{PhysicsConfig, World};

#[cfg(feature = "sleeping")]
pub use sleep::SleepState;
