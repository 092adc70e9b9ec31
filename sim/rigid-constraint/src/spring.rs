//! Torsion spring on a hinge.

use std::fmt;

use rigid_types::{BodyId, Result, SimError, VelocityMoments, WorldSpace};

use crate::constraint::{check_hinge, hinge_bodies, Constraint, StepContext};
use crate::precomputation::{HingeHandle, Precomputations};
use crate::settings::ConstraintSettings;
use crate::state::ConstraintForces;

/// Torque (N·m) as a function of hinge angle (rad).
pub type SpringFunction = Box<dyn Fn(f64) -> f64 + Send>;

/// Applies a torque depending on the hinge angle.
///
/// This is a force generator, not a velocity constraint: there is no
/// Jacobian solve. The torque is evaluated once in
/// [`Constraint::initialize_step`] and applied in the first solver iteration
/// of the step only.
pub struct AngularSpringConstraint {
    hinge: HingeHandle,
    bodies: (BodyId, BodyId),
    settings: ConstraintSettings,
    spring: SpringFunction,
    pending: Option<ConstraintForces>,
    torque: f64,
}

impl AngularSpringConstraint {
    /// Spring with an arbitrary torque function.
    ///
    /// Positive torque turns body 2 in the positive sense about the hinge
    /// axis relative to body 1.
    pub fn new(
        precomputations: &Precomputations,
        hinge: HingeHandle,
        spring: impl Fn(f64) -> f64 + Send + 'static,
    ) -> Result<Self> {
        Ok(Self {
            hinge,
            bodies: hinge_bodies(precomputations, hinge)?,
            settings: ConstraintSettings::labeled("angular spring"),
            spring: Box::new(spring),
            pending: None,
            torque: 0.0,
        })
    }

    /// Linear spring `τ(θ) = −k·θ` toward the assembly angle.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConstraint`] if `stiffness` is negative or
    /// not finite.
    pub fn hookean(
        precomputations: &Precomputations,
        hinge: HingeHandle,
        stiffness: f64,
    ) -> Result<Self> {
        if !(stiffness.is_finite() && stiffness >= 0.0) {
            return Err(SimError::invalid_constraint(format!(
                "spring stiffness must be non-negative and finite, got {stiffness}"
            )));
        }
        Self::new(precomputations, hinge, move |angle| -stiffness * angle)
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ConstraintSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Torque computed for the current step (N·m).
    #[must_use]
    pub fn torque(&self) -> f64 {
        self.torque
    }
}

impl fmt::Debug for AngularSpringConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AngularSpringConstraint")
            .field("hinge", &self.hinge)
            .field("bodies", &self.bodies)
            .field("settings", &self.settings)
            .field("torque", &self.torque)
            .finish_non_exhaustive()
    }
}

impl Constraint for AngularSpringConstraint {
    fn bodies(&self) -> (BodyId, BodyId) {
        self.bodies
    }

    fn settings(&self) -> &ConstraintSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut ConstraintSettings {
        &mut self.settings
    }

    fn validate(&self, precomputations: &Precomputations) -> Result<()> {
        check_hinge(precomputations, self.hinge, self.bodies)
    }

    fn initialize_step(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        self.pending = None;
        let data = ctx.hinge(self.hinge)?;
        let torque = (self.spring)(data.angle);
        if !torque.is_finite() {
            return Err(SimError::non_finite(format!(
                "spring torque of '{}'",
                self.settings.label()
            )));
        }

        self.torque = torque;
        self.pending = Some(ConstraintForces::torque_pair(data.a1, torque));
        Ok(())
    }

    fn constraint_forces(
        &mut self,
        _vm_1: &VelocityMoments<WorldSpace>,
        _vm_2: &VelocityMoments<WorldSpace>,
        _ctx: &StepContext<'_>,
    ) -> ConstraintForces {
        self.pending.take().unwrap_or_default()
    }
}
