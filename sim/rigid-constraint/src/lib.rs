//! Velocity-level joint constraints between rigid bodies.
//!
//! Every constraint connects two bodies and, once per solver visit, returns
//! the force and torque pair that drives their relative velocity to what the
//! joint allows.
//!
//! # Constraint Types
//!
//! - [`FixedConstraint`]: rigid weld (6 rows)
//! - [`HingeConstraint`]: rotation about one axis (5 rows)
//! - [`SliderConstraint`]: translation along one axis (5 rows)
//! - [`AngularMotorConstraint`]: rate-limited drive on a hinge
//! - [`AngularServoConstraint`]: position-controlled motor with PID and backlash
//! - [`AngularSpringConstraint`]: angle-dependent hinge torque
//! - [`AngularLimitsConstraint`], [`LinearLimitsConstraint`]: one-sided range limits
//!
//! # Precomputations
//!
//! Hinge and slider geometry is computed once per step in a shared
//! [`Precomputations`] arena and read by every constraint registered on the
//! same joint through a [`HingeHandle`] or [`SliderHandle`]. Data is stamped
//! with the step it was computed in; reading it in another step is an error,
//! never a silent reuse.
//!
//! # Constraint Formulation
//!
//! ```text
//! C(q) = 0                       (position constraint)
//! J·v  = 0                       (velocity constraint, J = dC/dq)
//! K    = J·M⁻¹·Jᵀ + cfm·I        (effective mass)
//! λ    = −K⁻¹·(J·v + β·C/dt)/dt  (constraint force)
//! ```
//!
//! `K` is inverted once per step in [`Constraint::initialize_step`]; each
//! solver visit then costs one matrix-vector product.
//!
//! # Example
//!
//! ```
//! use rigid_constraint::{
//!     BodyRef, Constraint, HingeConstraint, HingePrecomputation, Precomputations,
//! };
//! use rigid_types::{BodyCom, BodyId, Placement, SpaceVector, WorldSpace};
//!
//! let base = Placement::<WorldSpace, BodyCom>::identity();
//! let arm = Placement::from_position(SpaceVector::new(1.0, 0.0, 0.0));
//!
//! let mut precomputations = Precomputations::new();
//! let hinge = precomputations.add_hinge(
//!     HingePrecomputation::from_world(
//!         BodyRef::new(BodyId::new(0), &base),
//!         BodyRef::new(BodyId::new(1), &arm),
//!         SpaceVector::new(0.5, 0.0, 0.0),
//!         SpaceVector::z_axis(),
//!     )
//!     .unwrap(),
//! );
//!
//! let constraint = HingeConstraint::new(&precomputations, hinge).unwrap();
//! assert_eq!(constraint.label(), "hinge");
//! assert!(constraint.validate(&precomputations).is_ok());
//! ```

#![doc(html_root_url = "https://docs.rs/rigid-constraint/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::similar_names
)]

mod constraint;
mod fixed;
mod hinge;
mod hinge_precomputation;
mod jacobian;
mod limits;
mod motor;
mod pid;
mod precomputation;
mod servo;
mod settings;
mod slider;
mod slider_precalculation;
mod spring;
mod state;

pub use constraint::{AsAny, Constraint, StepContext};
pub use fixed::FixedConstraint;
pub use hinge::HingeConstraint;
pub use hinge_precomputation::{HingeData, HingePrecomputation, JointFrame};
pub use jacobian::{ClampedRow, ConstraintRow, JacobianRow, VelocitySolver};
pub use limits::{AngularLimitsConstraint, LimitState, LinearLimitsConstraint};
pub use motor::AngularMotorConstraint;
pub use pid::{PidController, PidSettings};
pub use precomputation::{
    FixedOrientationHelper, HingeHandle, Precomputation, Precomputations, SliderHandle, StepCache,
};
pub use servo::{
    make_standard_9gram_servo, make_standard_servo, AngularServoConstraint, ServoOrientation,
    NINE_GRAM_ANGULAR_VELOCITY_POTENTIAL, NINE_GRAM_TORQUE_POTENTIAL,
    STANDARD_ANGULAR_VELOCITY_POTENTIAL, STANDARD_TORQUE_POTENTIAL,
};
pub use settings::{ConstraintSettings, RowKind, Stabilization};
pub use slider::SliderConstraint;
pub use slider_precalculation::{SliderData, SliderPrecalculation};
pub use spring::{AngularSpringConstraint, SpringFunction};
pub use state::{BodyRef, BodyState, ConstraintForces};
