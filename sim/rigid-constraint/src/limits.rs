//! One-sided range limits on hinge angle and slider distance.

use rigid_types::{BodyId, Result, SimError, VelocityMoments, WorldSpace};

use crate::constraint::{
    check_hinge, check_slider, hinge_bodies, slider_bodies, Constraint, StepContext,
};
use crate::jacobian::{ClampedRow, ConstraintRow, JacobianRow};
use crate::precomputation::{HingeHandle, Precomputations, SliderHandle};
use crate::settings::{ConstraintSettings, RowKind};
use crate::state::ConstraintForces;

/// Which side of the range was violated at the start of the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitState {
    /// Inside the range; the limit applies no force.
    Free,
    /// Below the minimum.
    AtLower,
    /// Above the maximum.
    AtUpper,
}

fn validate_range(what: &str, min: f64, max: f64) -> Result<()> {
    if min.is_nan() || max.is_nan() || min > max {
        return Err(SimError::invalid_constraint(format!(
            "{what} range [{min}, {max}] is empty"
        )));
    }
    Ok(())
}

/// Classify `value` against `[min, max]` and return the violation.
fn classify(value: f64, min: f64, max: f64) -> (LimitState, f64) {
    if value < min {
        (LimitState::AtLower, value - min)
    } else if value > max {
        (LimitState::AtUpper, value - max)
    } else {
        (LimitState::Free, 0.0)
    }
}

/// Multiplier range that only pushes back into `[min, max]`.
fn push_back(state: LimitState) -> (f64, f64) {
    match state {
        LimitState::AtLower => (0.0, f64::INFINITY),
        LimitState::AtUpper => (f64::NEG_INFINITY, 0.0),
        LimitState::Free => (0.0, 0.0),
    }
}

/// Keeps a hinge angle inside `[min, max]`.
#[derive(Debug)]
pub struct AngularLimitsConstraint {
    hinge: HingeHandle,
    bodies: (BodyId, BodyId),
    settings: ConstraintSettings,
    min_angle: f64,
    max_angle: f64,
    state: LimitState,
    row: Option<ClampedRow>,
}

impl AngularLimitsConstraint {
    /// Limits on a registered hinge (rad).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConstraint`] if `min_angle > max_angle`.
    pub fn new(
        precomputations: &Precomputations,
        hinge: HingeHandle,
        min_angle: f64,
        max_angle: f64,
    ) -> Result<Self> {
        validate_range("angle", min_angle, max_angle)?;
        Ok(Self {
            hinge,
            bodies: hinge_bodies(precomputations, hinge)?,
            settings: ConstraintSettings::labeled("angular limits"),
            min_angle,
            max_angle,
            state: LimitState::Free,
            row: None,
        })
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ConstraintSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Allowed range (rad).
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        (self.min_angle, self.max_angle)
    }

    /// Change the allowed range.
    pub fn set_range(&mut self, min_angle: f64, max_angle: f64) -> Result<()> {
        validate_range("angle", min_angle, max_angle)?;
        self.min_angle = min_angle;
        self.max_angle = max_angle;
        Ok(())
    }

    /// Limit state at the start of the last step.
    #[must_use]
    pub fn state(&self) -> LimitState {
        self.state
    }
}

impl Constraint for AngularLimitsConstraint {
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
        self.row = None;
        let data = ctx.hinge(self.hinge)?;
        let (state, error) = classify(data.angle, self.min_angle, self.max_angle);
        self.state = state;
        if state == LimitState::Free {
            return Ok(());
        }

        let (s1, s2) = ctx.body_pair(self.bodies)?;
        let row = ConstraintRow::new(JacobianRow::angular(data.a1), error, RowKind::Angular);
        self.row = Some(ClampedRow::new(
            &row,
            s1,
            s2,
            &ctx.stabilization(&self.settings),
            ctx.dt,
            self.settings.label(),
            push_back(state),
        )?);
        Ok(())
    }

    fn constraint_forces(
        &mut self,
        vm_1: &VelocityMoments<WorldSpace>,
        vm_2: &VelocityMoments<WorldSpace>,
        _ctx: &StepContext<'_>,
    ) -> ConstraintForces {
        self.row
            .as_mut()
            .map_or_else(ConstraintForces::zero, |row| row.solve(vm_1, vm_2))
    }
}

/// Keeps a slider distance inside `[min, max]`.
#[derive(Debug)]
pub struct LinearLimitsConstraint {
    slider: SliderHandle,
    bodies: (BodyId, BodyId),
    settings: ConstraintSettings,
    min_distance: f64,
    max_distance: f64,
    state: LimitState,
    row: Option<ClampedRow>,
}

impl LinearLimitsConstraint {
    /// Limits on a registered slider (m).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConstraint`] if `min_distance > max_distance`.
    pub fn new(
        precomputations: &Precomputations,
        slider: SliderHandle,
        min_distance: f64,
        max_distance: f64,
    ) -> Result<Self> {
        validate_range("distance", min_distance, max_distance)?;
        Ok(Self {
            slider,
            bodies: slider_bodies(precomputations, slider)?,
            settings: ConstraintSettings::labeled("linear limits"),
            min_distance,
            max_distance,
            state: LimitState::Free,
            row: None,
        })
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ConstraintSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Allowed range (m).
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        (self.min_distance, self.max_distance)
    }

    /// Limit state at the start of the last step.
    #[must_use]
    pub fn state(&self) -> LimitState {
        self.state
    }
}

impl Constraint for LinearLimitsConstraint {
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
        check_slider(precomputations, self.slider, self.bodies)
    }

    fn initialize_step(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        self.row = None;
        let data = ctx.slider(self.slider)?;
        let (state, error) = classify(data.distance, self.min_distance, self.max_distance);
        self.state = state;
        if state == LimitState::Free {
            return Ok(());
        }

        let (s1, s2) = ctx.body_pair(self.bodies)?;
        let row = ConstraintRow::new(
            JacobianRow::linear(data.a, data.r1 + data.u, data.r2),
            error,
            RowKind::Linear,
        );
        self.row = Some(ClampedRow::new(
            &row,
            s1,
            s2,
            &ctx.stabilization(&self.settings),
            ctx.dt,
            self.settings.label(),
            push_back(state),
        )?);
        Ok(())
    }

    fn constraint_forces(
        &mut self,
        vm_1: &VelocityMoments<WorldSpace>,
        vm_2: &VelocityMoments<WorldSpace>,
        _ctx: &StepContext<'_>,
    ) -> ConstraintForces {
        self.row
            .as_mut()
            .map_or_else(ConstraintForces::zero, |row| row.solve(vm_1, vm_2))
    }
}
