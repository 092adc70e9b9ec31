//! Core types for rigid-body simulation.
//!
//! This crate provides the value types the constraint solver is built on:
//!
//! - [`SpaceVector`], [`SpaceMatrix`], [`RotationQuaternion`] - linear algebra
//!   tagged with the coordinate system it is expressed in
//! - [`Placement`] - position and orientation of one frame in another
//! - [`VelocityMoments`], [`AccelerationMoments`], [`ForceMoments`], [`Wrench`]
//! - [`MassMoments`], [`MassMomentsAtArm`] - mass and inertia
//! - [`Shape`] - triangulated surfaces with mass moments from density
//! - [`SolverConfig`], [`EvolverConfig`] - solver and stepping settings
//!
//! # Frames
//!
//! Every geometric quantity carries a zero-sized frame tag
//! ([`WorldSpace`], [`BodyCom`], [`BodyOrigin`], [`Airframe`], [`Ecef`]).
//! Operators only combine quantities with matching tags:
//!
//! ```compile_fail
//! use rigid_types::{BodyCom, SpaceVector, WorldSpace};
//!
//! let a = SpaceVector::<WorldSpace>::new(1.0, 0.0, 0.0);
//! let b = SpaceVector::<BodyCom>::new(1.0, 0.0, 0.0);
//! let _ = a + b; // frames differ
//! ```
//!
//! Conversions go through rotations and placements:
//!
//! ```
//! use rigid_types::{BodyCom, Placement, RotationQuaternion, SpaceVector, WorldSpace};
//!
//! let placement = Placement::<WorldSpace, BodyCom>::new(
//!     SpaceVector::new(0.0, 0.0, 10.0),
//!     RotationQuaternion::from_axis_angle(SpaceVector::z_axis(), 0.3),
//! );
//! let arm = SpaceVector::<BodyCom>::new(1.0, 2.0, 3.0);
//! let world = placement.bound_transform_to_base(arm);
//! let back = placement.bound_transform_to_body(world);
//!
//! assert!((back - arm).norm() < 1e-12);
//! ```
//!
//! # Units
//!
//! All quantities are SI: metres, seconds, kilograms, newtons, radians.

#![doc(html_root_url = "https://docs.rs/rigid-types/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc
)]

mod config;
mod error;
mod frame;
mod id;
mod mass;
mod moments;
mod placement;
mod shape;
mod space;

pub use config::{EvolverConfig, Limits, SolverConfig, DEFAULT_BAUMGARTE_FACTOR};
pub use error::SimError;
pub use frame::{Airframe, BodyCom, BodyOrigin, CoordinateSystem, Ecef, WorldSpace};
pub use id::{BodyId, ConstraintId};
pub use mass::{MassMoments, MassMomentsAtArm};
pub use moments::{AccelerationMoments, ForceMoments, VelocityMoments, Wrench};
pub use placement::Placement;
pub use shape::{Shape, ShapeVertex};
pub use space::{RotationQuaternion, SpaceMatrix, SpaceVector};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
