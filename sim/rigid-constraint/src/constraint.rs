//! The constraint interface seen by the solver.
//!
//! Each step runs in two phases:
//!
//! 1. [`Constraint::initialize_step`] reads the refreshed precomputations and
//!    builds everything that stays constant for the step (Jacobians, the `Z`
//!    matrix, stabilization bias).
//! 2. [`Constraint::constraint_forces`] is called once per solver iteration
//!    with the current velocity estimates and returns the force increment
//!    for the two bodies.
//!
//! After the last iteration [`Constraint::computed_constraint_forces`]
//! receives the total the constraint applied during the step.

use std::any::Any;
use std::fmt;

use rigid_types::{BodyId, Result, SimError, SolverConfig, VelocityMoments, WorldSpace};

use crate::hinge_precomputation::HingeData;
use crate::precomputation::{HingeHandle, Precomputation, Precomputations, SliderHandle};
use crate::settings::{ConstraintSettings, Stabilization};
use crate::slider_precalculation::SliderData;
use crate::state::{BodyState, ConstraintForces};

/// Downcasting support for boxed constraints.
pub trait AsAny {
    /// `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Read-only view of the system handed to constraints during a step.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// Step counter; precomputations are stamped with it.
    pub step: u64,
    /// Time step (s).
    pub dt: f64,
    /// Snapshot of every body, indexed by [`BodyId::index`].
    pub bodies: &'a [BodyState],
    /// Precomputations refreshed for `step`.
    pub precomputations: &'a Precomputations,
    /// Solver-wide settings.
    pub config: &'a SolverConfig,
}

impl<'a> StepContext<'a> {
    /// Snapshot of one body.
    pub fn body(&self, id: BodyId) -> Result<&'a BodyState> {
        self.bodies
            .get(id.index())
            .ok_or(SimError::InvalidBodyId(id.raw()))
    }

    /// Both bodies of a constraint.
    pub fn body_pair(&self, (b1, b2): (BodyId, BodyId)) -> Result<(&'a BodyState, &'a BodyState)> {
        Ok((self.body(b1)?, self.body(b2)?))
    }

    /// Hinge geometry for this step.
    pub fn hinge(&self, handle: HingeHandle) -> Result<&'a HingeData> {
        self.precomputations.hinge_data(handle, self.step)
    }

    /// Slider geometry for this step.
    pub fn slider(&self, handle: SliderHandle) -> Result<&'a SliderData> {
        self.precomputations.slider_data(handle, self.step)
    }

    /// Stabilization parameters for a constraint with `settings`.
    #[must_use]
    pub fn stabilization(&self, settings: &ConstraintSettings) -> Stabilization {
        settings.stabilization(self.config)
    }
}

impl fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContext")
            .field("step", &self.step)
            .field("dt", &self.dt)
            .field("bodies", &self.bodies.len())
            .field("precomputations", &self.precomputations.len())
            .finish_non_exhaustive()
    }
}

/// A velocity-level constraint between two bodies.
pub trait Constraint: AsAny + Send + fmt::Debug {
    /// The two bodies, fixed for the constraint's lifetime.
    fn bodies(&self) -> (BodyId, BodyId);

    /// Common settings.
    fn settings(&self) -> &ConstraintSettings;

    /// Common settings, mutable.
    fn settings_mut(&mut self) -> &mut ConstraintSettings;

    /// Label used in logs and errors.
    fn label(&self) -> &str {
        self.settings().label()
    }

    /// Check that the constraint fits `precomputations`.
    ///
    /// Called once when the constraint is added to a system.
    fn validate(&self, _precomputations: &Precomputations) -> Result<()> {
        Ok(())
    }

    /// Prepare for a step.
    ///
    /// # Errors
    ///
    /// A failing constraint is skipped for this step only. Typical failures
    /// are [`SimError::SingularConstraint`] and
    /// [`SimError::StalePrecomputation`].
    fn initialize_step(&mut self, ctx: &StepContext<'_>) -> Result<()>;

    /// Force increment for one solver iteration.
    ///
    /// `vm_1` and `vm_2` are the velocity estimates of the two bodies
    /// including every force applied so far in this step.
    fn constraint_forces(
        &mut self,
        vm_1: &VelocityMoments<WorldSpace>,
        vm_2: &VelocityMoments<WorldSpace>,
        ctx: &StepContext<'_>,
    ) -> ConstraintForces;

    /// Total forces this constraint applied during the step.
    fn computed_constraint_forces(&mut self, _total: &ConstraintForces, _ctx: &StepContext<'_>) {}
}

/// Bodies of a hinge-based constraint, checking the handle.
pub(crate) fn hinge_bodies(
    precomputations: &Precomputations,
    handle: HingeHandle,
) -> Result<(BodyId, BodyId)> {
    Ok(precomputations.hinge(handle)?.bodies())
}

/// Bodies of a slider-based constraint, checking the handle.
pub(crate) fn slider_bodies(
    precomputations: &Precomputations,
    handle: SliderHandle,
) -> Result<(BodyId, BodyId)> {
    Ok(precomputations.slider(handle)?.bodies())
}

/// Fail unless `handle` in `precomputations` joins `bodies`.
pub(crate) fn check_hinge(
    precomputations: &Precomputations,
    handle: HingeHandle,
    bodies: (BodyId, BodyId),
) -> Result<()> {
    if hinge_bodies(precomputations, handle)? == bodies {
        Ok(())
    } else {
        Err(SimError::invalid_constraint(format!(
            "hinge precomputation {} joins other bodies",
            handle.index()
        )))
    }
}

/// Fail unless `handle` in `precomputations` joins `bodies`.
pub(crate) fn check_slider(
    precomputations: &Precomputations,
    handle: SliderHandle,
    bodies: (BodyId, BodyId),
) -> Result<()> {
    if slider_bodies(precomputations, handle)? == bodies {
        Ok(())
    } else {
        Err(SimError::invalid_constraint(format!(
            "slider precalculation {} joins other bodies",
            handle.index()
        )))
    }
}
